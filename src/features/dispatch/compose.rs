//! # Notification Composition
//!
//! Turns today's matches into one push summary and one email digest.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Include a suggested greeting per contact in the email
//! - 1.0.0: Birthday digest email with plain-text and HTML bodies

use chrono::NaiveDate;

use crate::features::channels::{OutgoingEmail, PushNotification};
use crate::features::matching::{OccasionKind, OccasionMatch};
use crate::features::messages::{generate, Entropy, GenerateOptions};

pub const PUSH_TITLE: &str = "ConnectKeep Daily Reminder";
pub const TEST_EMAIL_SUBJECT: &str = "Test from ConnectKeep";
pub const TEST_EMAIL_MESSAGE: &str =
    "This is a test email from ConnectKeep. If you received this, email notifications are working!";

/// Single push summarising how many occasions fall today
pub fn compose_push(matches: &[OccasionMatch], app_url: &str) -> PushNotification {
    let count = matches.len();
    let body = if count == 1 {
        "1 celebration today. Send your wishes!".to_string()
    } else {
        format!("{} celebrations today. Send your wishes!", count)
    };

    PushNotification {
        title: PUSH_TITLE.to_string(),
        body,
        data: serde_json::json!({
            "url": format!("{}/contacts", app_url),
            "match_count": count,
        }),
    }
}

/// Email listing every match with its age or years and a suggested greeting
pub fn compose_email(
    to: &str,
    matches: &[OccasionMatch],
    today: NaiveDate,
    app_url: &str,
    entropy: &mut dyn Entropy,
) -> OutgoingEmail {
    let count = matches.len();
    let all_birthdays = matches.iter().all(|m| m.kind == OccasionKind::Birthday);
    let subject = if all_birthdays {
        format!("You have {} birthday(s) today!", count)
    } else {
        format!("You have {} reminder(s) today!", count)
    };

    let entries: Vec<(String, String)> = matches
        .iter()
        .map(|m| {
            let greeting = generate(
                &m.contact,
                m.kind.into(),
                today,
                GenerateOptions::default(),
                entropy,
            );
            (describe(m), greeting)
        })
        .collect();

    let mut text = format!(
        "Hello,\n\nYou have {} contact(s) to celebrate today:\n\n",
        count
    );
    for (line, greeting) in &entries {
        text.push_str(&format!("- {}\n  Suggested message: {}\n", line, greeting));
    }
    text.push_str(&format!(
        "\nLog in to ConnectKeep to send them your wishes: {}\n\nBest regards,\nThe ConnectKeep Team",
        app_url
    ));

    let items: String = entries
        .iter()
        .map(|(line, greeting)| {
            format!(
                "<li><strong>{}</strong><br><em>{}</em></li>",
                escape_html(line),
                escape_html(greeting)
            )
        })
        .collect();
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #3b82f6;">Today's Reminders</h2>
  <p>Hello,</p>
  <p>You have <strong>{count}</strong> contact(s) to celebrate today:</p>
  <ul>{items}</ul>
  <p>Log in to <a href="{url}" style="color: #3b82f6; text-decoration: none;">ConnectKeep</a> to send them your wishes!</p>
  <p>Best regards,<br>The ConnectKeep Team</p>
</div>"#,
        count = count,
        items = items,
        url = escape_html(app_url),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body: text,
        html_body: html,
    }
}

/// Fixed message used to verify the email channel
pub fn compose_test_email(to: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: TEST_EMAIL_SUBJECT.to_string(),
        text_body: TEST_EMAIL_MESSAGE.to_string(),
        html_body: format!("<p>{}</p>", TEST_EMAIL_MESSAGE),
    }
}

fn describe(m: &OccasionMatch) -> String {
    let name = m.contact.name.trim();
    match (m.kind, m.years) {
        (_, 0) => format!("{} ({})", name, m.kind),
        (OccasionKind::Birthday, years) => format!("{} (turning {})", name, years),
        (OccasionKind::Anniversary, 1) => format!("{} (1 year anniversary)", name),
        (OccasionKind::Anniversary, years) => format!("{} ({} years anniversary)", name, years),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::contacts::Contact;
    use crate::features::messages::ScriptedEntropy;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn birthday_match(name: &str, years: u32) -> OccasionMatch {
        OccasionMatch {
            contact: Contact::new(name, "u1", name).with_birthday(date(2024 - years as i32, 3, 15)),
            kind: OccasionKind::Birthday,
            years,
        }
    }

    #[test]
    fn test_compose_push_summarises_count() {
        let single = compose_push(&[birthday_match("Ada", 34)], "https://connectkeep.app");
        assert_eq!(single.title, PUSH_TITLE);
        assert_eq!(single.body, "1 celebration today. Send your wishes!");
        assert_eq!(single.data["url"], "https://connectkeep.app/contacts");
        assert_eq!(single.data["match_count"], 1);

        let many = compose_push(
            &[birthday_match("Ada", 34), birthday_match("Bob", 40)],
            "https://connectkeep.app",
        );
        assert_eq!(many.body, "2 celebrations today. Send your wishes!");
    }

    #[test]
    fn test_compose_email_lists_every_match() {
        let matches = vec![
            birthday_match("Ada", 34),
            OccasionMatch {
                contact: Contact::new("c2", "u1", "Sam & Alex").with_anniversary(date(2012, 3, 15)),
                kind: OccasionKind::Anniversary,
                years: 12,
            },
        ];
        let mut entropy = ScriptedEntropy::new(vec![0]);
        let email = compose_email(
            "me@example.com",
            &matches,
            date(2024, 3, 15),
            "https://connectkeep.app",
            &mut entropy,
        );

        assert_eq!(email.to, "me@example.com");
        assert_eq!(email.subject, "You have 2 reminder(s) today!");
        assert!(email.text_body.contains("- Ada (turning 34)"));
        assert!(email.text_body.contains("- Sam & Alex (12 years anniversary)"));
        assert!(email.text_body.contains("Happy 34th birthday, Ada!"));
        assert!(email.html_body.contains("<strong>Ada (turning 34)</strong>"));
        assert!(email.html_body.contains("Sam &amp; Alex"));
        assert!(!email.html_body.contains("Sam & Alex"));
    }

    #[test]
    fn test_compose_email_birthday_subject() {
        let mut entropy = ScriptedEntropy::new(vec![1]);
        let email = compose_email(
            "me@example.com",
            &[birthday_match("Ada", 34)],
            date(2024, 3, 15),
            "https://connectkeep.app",
            &mut entropy,
        );
        assert_eq!(email.subject, "You have 1 birthday(s) today!");
    }

    #[test]
    fn test_describe_without_years() {
        let m = birthday_match("Newborn", 0);
        assert_eq!(describe(&m), "Newborn (birthday)");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"O'Neil\" & co</b>"),
            "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;"
        );
    }
}
