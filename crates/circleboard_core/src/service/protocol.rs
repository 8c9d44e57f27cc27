//! Markdown protocol rendering for completed meetings.

use crate::model::meeting::{AgendaItem, Attendee, Meeting, MeetingType, RoundEntry};
use crate::model::person::PersonId;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Everything the protocol text is rendered from.
pub struct ProtocolInput<'a> {
    pub meeting: &'a Meeting,
    pub circle_name: &'a str,
    pub facilitator_name: Option<&'a str>,
    pub attendees: &'a [Attendee],
    /// Names of commenters and round authors who may not be attendees.
    pub participant_names: &'a [(PersonId, String)],
    pub check_ins: &'a [RoundEntry],
    pub agenda_items: &'a [AgendaItem],
    pub closings: &'a [RoundEntry],
}

impl ProtocolInput<'_> {
    fn name_of(&self, person_uuid: PersonId) -> String {
        self.attendees
            .iter()
            .find(|attendee| attendee.person_uuid == person_uuid)
            .map(|attendee| attendee.display_name.clone())
            .or_else(|| {
                self.participant_names
                    .iter()
                    .find(|(id, _)| *id == person_uuid)
                    .map(|(_, name)| name.clone())
            })
            .unwrap_or_else(|| short_id(person_uuid))
    }
}

pub fn render_protocol(input: &ProtocolInput<'_>) -> String {
    let mut out = String::new();
    match write_protocol(&mut out, input) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

fn write_protocol(out: &mut String, input: &ProtocolInput<'_>) -> std::fmt::Result {
    let kind = match input.meeting.meeting_type {
        MeetingType::Tactical => "Tactical meeting",
        MeetingType::Governance => "Governance meeting",
    };

    writeln!(out, "# {kind}: {}", input.circle_name)?;
    writeln!(out)?;
    writeln!(out, "- Date: {}", format_meeting_date(input.meeting.scheduled_at))?;
    writeln!(
        out,
        "- Facilitator: {}",
        input.facilitator_name.unwrap_or("none")
    )?;

    writeln!(out)?;
    writeln!(out, "## Attendees")?;
    writeln!(out)?;
    if input.attendees.is_empty() {
        writeln!(out, "_none_")?;
    }
    for attendee in input.attendees {
        writeln!(out, "- {}", attendee.display_name)?;
    }

    write_round(out, "Check-in", input.check_ins, input)?;

    writeln!(out)?;
    writeln!(out, "## Agenda")?;
    if input.agenda_items.is_empty() {
        writeln!(out)?;
        writeln!(out, "_no agenda items_")?;
    }
    for item in input.agenda_items {
        writeln!(out)?;
        let title = item.title.as_deref().unwrap_or("Untitled item");
        writeln!(out, "### {}. {title}", item.position)?;
        writeln!(out)?;
        let status = if item.is_processed { "processed" } else { "open" };
        writeln!(out, "- Status: {status}")?;
        match item.outcome.as_deref().map(str::trim) {
            Some(outcome) if !outcome.is_empty() => writeln!(out, "- Outcome: {outcome}")?,
            _ => writeln!(out, "- Outcome: _none recorded_")?,
        }
        for comment in &item.comments {
            writeln!(
                out,
                "  - {}: {}",
                input.name_of(comment.person_uuid),
                comment.content
            )?;
        }
    }

    write_round(out, "Closing", input.closings, input)
}

fn write_round(
    out: &mut String,
    heading: &str,
    entries: &[RoundEntry],
    input: &ProtocolInput<'_>,
) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "## {heading}")?;
    writeln!(out)?;
    if entries.is_empty() {
        writeln!(out, "_no entries_")?;
    }
    for entry in entries {
        writeln!(out, "- {}: {}", input.name_of(entry.person_uuid), entry.content)?;
    }
    Ok(())
}

/// `YYYY-MM-DD HH:MM UTC`; out-of-range timestamps fall back to the raw value.
pub fn format_meeting_date(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(date) => date.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => format!("{epoch_ms} ms"),
    }
}

fn short_id(id: PersonId) -> String {
    id.simple().to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::{format_meeting_date, render_protocol, ProtocolInput};
    use crate::model::meeting::{
        AgendaComment, AgendaItem, Attendee, Meeting, MeetingType, RoundEntry, RoundPhase,
    };
    use uuid::Uuid;

    #[test]
    fn meeting_date_is_rendered_in_utc() {
        assert_eq!(format_meeting_date(0), "1970-01-01 00:00 UTC");
        assert_eq!(format_meeting_date(1_700_000_000_000), "2023-11-14 22:13 UTC");
    }

    #[test]
    fn protocol_lists_rounds_agenda_and_comments() {
        let meeting = Meeting::new(Uuid::new_v4(), MeetingType::Tactical, 0);
        let anna = Uuid::new_v4();
        let attendees = vec![Attendee {
            person_uuid: anna,
            display_name: "Anna".to_string(),
            joined_at: 0,
        }];
        let check_ins = vec![RoundEntry {
            uuid: Uuid::new_v4(),
            meeting_uuid: meeting.uuid,
            person_uuid: anna,
            phase: RoundPhase::CheckIn,
            content: "Gut angekommen".to_string(),
            updated_at: 0,
        }];
        let item_uuid = Uuid::new_v4();
        let agenda_items = vec![AgendaItem {
            uuid: item_uuid,
            meeting_uuid: meeting.uuid,
            position: 1,
            tension_uuid: None,
            title: Some("Sommerfest".to_string()),
            notes: None,
            is_processed: true,
            outcome: Some("Termin steht".to_string()),
            comments: vec![AgendaComment {
                uuid: Uuid::new_v4(),
                agenda_item_uuid: item_uuid,
                person_uuid: anna,
                content: "Ich helfe".to_string(),
                created_at: 0,
            }],
        }];

        let text = render_protocol(&ProtocolInput {
            meeting: &meeting,
            circle_name: "Elternrat",
            facilitator_name: Some("Anna"),
            attendees: &attendees,
            participant_names: &[],
            check_ins: &check_ins,
            agenda_items: &agenda_items,
            closings: &[],
        });

        assert!(text.starts_with("# Tactical meeting: Elternrat\n"));
        assert!(text.contains("- Facilitator: Anna"));
        assert!(text.contains("- Anna: Gut angekommen"));
        assert!(text.contains("### 1. Sommerfest"));
        assert!(text.contains("- Outcome: Termin steht"));
        assert!(text.contains("  - Anna: Ich helfe"));
        assert!(text.contains("## Closing\n\n_no entries_"));
    }

    #[test]
    fn non_attendee_authors_are_named_from_participants() {
        let meeting = Meeting::new(Uuid::new_v4(), MeetingType::Governance, 0);
        let ole = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let closings = vec![
            RoundEntry {
                uuid: Uuid::new_v4(),
                meeting_uuid: meeting.uuid,
                person_uuid: ole,
                phase: RoundPhase::Closing,
                content: "Danke".to_string(),
                updated_at: 0,
            },
            RoundEntry {
                uuid: Uuid::new_v4(),
                meeting_uuid: meeting.uuid,
                person_uuid: stranger,
                phase: RoundPhase::Closing,
                content: "Tschüss".to_string(),
                updated_at: 0,
            },
        ];
        let names = vec![(ole, "Ole".to_string())];

        let text = render_protocol(&ProtocolInput {
            meeting: &meeting,
            circle_name: "Vorstand",
            facilitator_name: None,
            attendees: &[],
            participant_names: &names,
            check_ins: &[],
            agenda_items: &[],
            closings: &closings,
        });

        assert!(text.contains("- Ole: Danke"));
        let fragment: String = stranger.simple().to_string().chars().take(8).collect();
        assert!(text.contains(&format!("- {fragment}: Tschüss")));
        assert!(text.contains("- Facilitator: none"));
    }
}
