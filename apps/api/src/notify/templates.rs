use crate::notify::{Notification, ViewerContact};

/// Builds the owner notification for a resume view. The plain-text part
/// carries the submitted values as-is; the HTML part escapes them.
pub fn render_viewer_notification(contact: &ViewerContact) -> Notification {
    let resume = contact.resume_id().unwrap_or("(none)");
    let fields = [
        ("From", contact.email.as_str()),
        ("Company", contact.company.as_str()),
        ("Phone", contact.phone.as_str()),
        ("Where We Met", contact.where_we_met.as_str()),
        ("Position", contact.position.as_str()),
        ("Requested Resume", resume),
    ];

    let mut plain = String::from("Resume Viewed\n\n");
    let mut html = String::from("<h2>Resume Viewed</h2>\n");
    for (label, value) in fields {
        plain.push_str(&format!("{label}: {value}\n"));
        html.push_str(&format!(
            "<p><strong>{label}:</strong> {}</p>\n",
            escape_html(value)
        ));
    }

    Notification {
        subject: format!("Resume viewed - {}", contact.company),
        plain,
        html,
    }
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
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
    use crate::testing::viewer_contact as contact;

    #[test]
    fn test_plain_body_contains_every_value() {
        let c = contact();
        let n = render_viewer_notification(&c);
        for value in [&c.email, &c.company, &c.phone, &c.where_we_met, &c.position] {
            assert!(n.plain.contains(value.as_str()), "missing {value}");
        }
        assert!(n.plain.contains("Requested Resume: 42"));
        assert_eq!(n.subject, "Resume viewed - Acme");
    }

    #[test]
    fn test_html_body_escapes_markup() {
        let mut c = contact();
        c.company = "<script>alert(1)</script> & Co".to_string();
        let n = render_viewer_notification(&c);
        assert!(!n.html.contains("<script>"));
        assert!(n.html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; Co"));
        assert!(n.plain.contains("<script>alert(1)</script> & Co"));
    }

    #[test]
    fn test_missing_resume_id_rendered_as_none() {
        let mut c = contact();
        c.resume_id = None;
        assert!(render_viewer_notification(&c).plain.contains("Requested Resume: (none)"));
    }

    #[test]
    fn test_escape_html_passthrough() {
        assert_eq!(escape_html("plain text 123"), "plain text 123");
        assert_eq!(escape_html("O'Neil \"Q\""), "O&#39;Neil &quot;Q&quot;");
    }
}
