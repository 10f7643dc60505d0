//! Prompt templates for triage and summaries.

use crate::models::{Appointment, Message};

pub const TRIAGE_SYSTEM: &str = "You are a medical intake assistant for an appointment-booking \
service. You never diagnose or prescribe. Given a patient's symptom description, respond with a \
fenced JSON block:\n\
```json\n\
{\"specialty\": \"<one of: general practice, cardiology, dermatology, neurology, orthopedics, \
pediatrics, psychiatry, gastroenterology, pulmonology, ophthalmology>\", \
\"urgency\": \"<routine|soon|emergency>\", \"advice\": \"<two sentences of plain-language guidance>\"}\n\
```\n\
After the JSON block, write a short empathetic reply to the patient. If the symptoms suggest an \
emergency, say so clearly and set urgency to emergency.";

pub const SUMMARY_SYSTEM: &str = "You are a clinical assistant. Summarize the patient's \
appointment history for their care team in at most five sentences. Stick to the facts given; do \
not invent findings.";

/// Build the triage prompt from the latest message plus prior turns.
pub fn triage_prompt(history: &[Message], latest: &str) -> String {
    let mut prompt = String::new();
    for msg in history {
        prompt.push_str(msg.sender.as_str());
        prompt.push_str(": ");
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }
    prompt.push_str("patient: ");
    prompt.push_str(latest);
    prompt
}

/// Build the summary prompt from a patient's appointment records.
pub fn summary_prompt(patient_name: &str, appointments: &[Appointment]) -> String {
    let mut prompt = format!("Patient: {patient_name}\nAppointments:\n");
    if appointments.is_empty() {
        prompt.push_str("(none on record)\n");
    }
    for appt in appointments {
        prompt.push_str(&format!(
            "- {} {} with doctor {} ({})\n",
            appt.date,
            appt.time_label,
            appt.doctor_id,
            appt.status.as_str(),
        ));
    }
    prompt
}
