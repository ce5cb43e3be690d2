//! Desktop notification support for new mail alerts

/// Summary line for a new-mail notification
pub fn summary(count: usize) -> String {
    if count == 1 {
        "New mail".to_string()
    } else {
        format!("{} new threads", count)
    }
}

/// Send a notification for threads added by a background refresh.
/// `accounts` are the names of accounts that opted into notifications;
/// with `show_preview` they are listed in the body.
pub fn notify_new_mail(count: usize, accounts: &[String], show_preview: bool) {
    if count == 0 || accounts.is_empty() {
        return;
    }
    let summary = summary(count);
    let body = show_preview.then(|| accounts.join(", "));

    // Fire and forget, don't block on errors
    if let Err(e) = send_notification(&summary, body.as_deref()) {
        tracing::warn!("Failed to send desktop notification: {}", e);
    }
}

#[cfg(feature = "notifications")]
fn send_notification(summary: &str, body: Option<&str>) -> Result<(), notify_rust::error::Error> {
    use notify_rust::Notification;

    let mut notification = Notification::new();
    notification
        .summary(summary)
        .appname("inbox")
        .icon("mail-unread")
        .timeout(notify_rust::Timeout::Milliseconds(5000));
    if let Some(body) = body {
        notification.body(body);
    }
    notification.show()?;
    Ok(())
}

/// Without desktop notifications, ring the terminal bell
#[cfg(not(feature = "notifications"))]
fn send_notification(summary: &str, body: Option<&str>) -> std::io::Result<()> {
    use std::io::Write;

    tracing::info!("{} {}", summary, body.unwrap_or_default());
    let mut stdout = std::io::stdout();
    stdout.write_all(b"\x07")?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wording() {
        assert_eq!(summary(1), "New mail");
        assert_eq!(summary(3), "3 new threads");
    }
}
