use super::sendmail::{MailError, Mailer};

const EXPIRY_TEMPLATE: &str = include_str!("templates/Verification-expiry.html");

pub fn days_left_label(days_left: i64) -> String {
    match days_left {
        0 => "less than a day".to_string(),
        1 => "1 day".to_string(),
        n => format!("{} days", n),
    }
}

pub async fn send_verification_expiry_email(
    mailer: &Mailer,
    to_email: &str,
    owner_name: &str,
    property_title: &str,
    days_left: i64,
    app_url: &str,
) -> Result<(), MailError> {
    let subject = format!("Verification for \"{}\" expires soon", property_title);
    let renew_link = format!("{}/dashboard/properties", app_url.trim_end_matches('/'));

    let placeholders = vec![
        ("{{owner_name}}".to_string(), owner_name.to_string()),
        ("{{property_title}}".to_string(), property_title.to_string()),
        ("{{days_left}}".to_string(), days_left_label(days_left)),
        ("{{renew_link}}".to_string(), renew_link),
    ];

    mailer
        .send_email(to_email, &subject, EXPIRY_TEMPLATE, &placeholders)
        .await
}
