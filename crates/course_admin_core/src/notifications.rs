//! crates/course_admin_core/src/notifications.rs
//!
//! Email bodies sent to students. Each template renders an HTML body and a
//! plain-text alternative.

use crate::ports::MailMessage;

const BRAND: &str = "Edzeeta";

/// Sent after an admin creates a student account.
pub fn welcome_email(to: &str, course_titles: &[String]) -> MailMessage {
    let courses = if course_titles.is_empty() {
        "-".to_string()
    } else {
        course_titles.join(", ")
    };
    let email = escape(to);
    let html = layout(
        &format!("Welcome to {BRAND}"),
        &format!(
            "<p>Thank you for choosing {BRAND}!</p>\
             <p>Your course enrollment is complete.</p>\
             <div class=\"details\">\
             <p><strong>Email:</strong> {email}</p>\
             <p><strong>Courses Registered:</strong> {}</p>\
             </div>\
             <p>You can now access your courses through our LMS platform. \
             Use the password your administrator gave you, or request a reset link from the sign-in page.</p>",
            escape(&courses)
        ),
    );
    let text = format!(
        "Welcome to {BRAND}!\n\nYour course enrollment is complete.\n\n\
         Email: {to}\nCourses Registered: {courses}\n\n\
         You can now access your courses through our LMS platform.\n"
    );
    MailMessage {
        to: to.to_string(),
        subject: format!("Welcome to {BRAND} - Your Course Registration is Complete"),
        html: Some(html),
        text,
    }
}

pub fn password_reset_email(to: &str, link: &str) -> MailMessage {
    let html = layout(
        "Reset your password",
        &format!(
            "<p>We received a request to reset the password of your {BRAND} account.</p>\
             <p><a href=\"{0}\">Choose a new password</a></p>\
             <p>If you did not ask for this, you can ignore this email.</p>",
            escape(link)
        ),
    );
    let text = format!(
        "We received a request to reset the password of your {BRAND} account.\n\n\
         Choose a new password: {link}\n\n\
         If you did not ask for this, you can ignore this email.\n"
    );
    MailMessage {
        to: to.to_string(),
        subject: format!("Reset your {BRAND} password"),
        html: Some(html),
        text,
    }
}

fn layout(heading: &str, body: &str) -> String {
    let year = chrono::Utc::now().format("%Y");
    format!(
        "<!DOCTYPE html><html><head><style>\
         body {{ font-family: Arial, sans-serif; line-height: 1.6; margin: 0; }}\
         .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}\
         .header {{ background-color: #004aad; color: white; padding: 20px; text-align: center; }}\
         .details {{ background-color: white; padding: 20px; border-radius: 5px; }}\
         .footer {{ text-align: center; color: #6c757d; font-size: 14px; }}\
         </style></head><body><div class=\"container\">\
         <div class=\"header\"><h1>{heading}</h1></div>\
         <div class=\"content\">{body}</div>\
         <div class=\"footer\"><p>&copy; {year} {BRAND}. All rights reserved.</p></div>\
         </div></body></html>"
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
