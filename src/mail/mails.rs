use super::sendmail::{render_template, RenderedEmail};
use crate::models::{registrationmodel::AccountCategory, usermodel::AccountTier};

const OTP_TEMPLATE: &str = include_str!("templates/OTP-email.html");
const WELCOME_TEMPLATE: &str = include_str!("templates/Welcome-email.html");
const ORDER_RECEIPT_TEMPLATE: &str = include_str!("templates/OrderReceipt-email.html");
const NEW_MESSAGE_TEMPLATE: &str = include_str!("templates/NewMessage-email.html");
const JOB_APPLICATION_TEMPLATE: &str = include_str!("templates/JobApplication-email.html");

pub fn otp_email(to_email: &str, username: &str, otp_code: &str, expires_minutes: i64) -> RenderedEmail {
    let placeholders = [
        ("username", username.to_string()),
        ("otp_code", otp_code.to_string()),
        ("expires_minutes", expires_minutes.to_string()),
    ];

    RenderedEmail {
        to: to_email.to_string(),
        subject: "Your GigHub verification code".to_string(),
        html: render_template(OTP_TEMPLATE, &placeholders),
        text: format!(
            "Hi {},\n\nYour verification code is {}. It expires in {} minutes.\n\nIf you did not sign up, ignore this email.",
            username, otp_code, expires_minutes
        ),
    }
}

struct WelcomeContent {
    subject: &'static str,
    headline: &'static str,
    body: &'static str,
    call_to_action: &'static str,
    path: &'static str,
}

fn welcome_content(category: AccountCategory) -> WelcomeContent {
    match category {
        AccountCategory::Organization => WelcomeContent {
            subject: "Welcome to GigHub for organizations",
            headline: "Your organization account is ready",
            body: "Post your first job and start receiving applications from remote talent.",
            call_to_action: "Post a job",
            path: "/jobs/new",
        },
        AccountCategory::RemoteWorker(AccountTier::Vip) => WelcomeContent {
            subject: "Welcome to GigHub VIP",
            headline: "Your VIP remote-worker account is ready",
            body: "VIP members get priority placement on applications. Browse open jobs now.",
            call_to_action: "Browse jobs",
            path: "/jobs",
        },
        AccountCategory::RemoteWorker(AccountTier::Free) => WelcomeContent {
            subject: "Welcome to GigHub",
            headline: "Your remote-worker account is ready",
            body: "Browse open jobs and apply in a few clicks. Upgrade to VIP any time for priority placement.",
            call_to_action: "Browse jobs",
            path: "/jobs",
        },
        AccountCategory::Admin => WelcomeContent {
            subject: "GigHub admin access",
            headline: "Your admin account is active",
            body: "The admin dashboard shows users, gigs, orders and platform earnings.",
            call_to_action: "Open dashboard",
            path: "/dashboard/admin",
        },
        AccountCategory::Seller => WelcomeContent {
            subject: "Welcome to GigHub, seller",
            headline: "Start selling your skills",
            body: "Create your first gig so buyers can find you. You keep 90% of every sale.",
            call_to_action: "Create a gig",
            path: "/gigs/new",
        },
        AccountCategory::General => WelcomeContent {
            subject: "Welcome to GigHub",
            headline: "Your account is ready",
            body: "Find talented freelancers for any job, from design to development.",
            call_to_action: "Explore gigs",
            path: "/gigs",
        },
    }
}

pub fn welcome_email(
    to_email: &str,
    username: &str,
    category: AccountCategory,
    app_url: &str,
) -> RenderedEmail {
    let content = welcome_content(category);
    let link = format!("{}{}", app_url.trim_end_matches('/'), content.path);
    let placeholders = [
        ("username", username.to_string()),
        ("headline", content.headline.to_string()),
        ("body", content.body.to_string()),
        ("call_to_action", content.call_to_action.to_string()),
        ("app_url", link.clone()),
    ];

    RenderedEmail {
        to: to_email.to_string(),
        subject: content.subject.to_string(),
        html: render_template(WELCOME_TEMPLATE, &placeholders),
        text: format!(
            "Hi {},\n\n{}\n\n{}\n\n{}: {}",
            username, content.headline, content.body, content.call_to_action, link
        ),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn order_receipt_email(
    to_email: &str,
    username: &str,
    gig_title: &str,
    amount: f64,
    currency: &str,
    reference: &str,
    gateway: &str,
    app_url: &str,
) -> RenderedEmail {
    let amount = format!("{:.2}", amount);
    let placeholders = [
        ("username", username.to_string()),
        ("gig_title", gig_title.to_string()),
        ("amount", amount.clone()),
        ("currency", currency.to_string()),
        ("reference", reference.to_string()),
        ("gateway", gateway.to_string()),
        ("app_url", app_url.trim_end_matches('/').to_string()),
    ];

    RenderedEmail {
        to: to_email.to_string(),
        subject: format!("Receipt for {}", gig_title),
        html: render_template(ORDER_RECEIPT_TEMPLATE, &placeholders),
        text: format!(
            "Hi {},\n\nYour order for \"{}\" is confirmed.\nAmount: {} {}\nReference: {}\nPaid with: {}",
            username, gig_title, amount, currency, reference, gateway
        ),
    }
}

pub fn new_message_email(
    to_email: &str,
    username: &str,
    sender: &str,
    preview: &str,
    conversation_id: &str,
    app_url: &str,
) -> RenderedEmail {
    let placeholders = [
        ("username", username.to_string()),
        ("sender", sender.to_string()),
        ("preview", preview.to_string()),
        ("conversation_id", conversation_id.to_string()),
        ("app_url", app_url.trim_end_matches('/').to_string()),
    ];

    RenderedEmail {
        to: to_email.to_string(),
        subject: format!("New message from {}", sender),
        html: render_template(NEW_MESSAGE_TEMPLATE, &placeholders),
        text: format!("Hi {},\n\n{} sent you a message:\n\n{}", username, sender, preview),
    }
}

pub fn job_application_email(
    to_email: &str,
    username: &str,
    applicant: &str,
    job_title: &str,
    job_id: &str,
    app_url: &str,
) -> RenderedEmail {
    let placeholders = [
        ("username", username.to_string()),
        ("applicant", applicant.to_string()),
        ("job_title", job_title.to_string()),
        ("job_id", job_id.to_string()),
        ("app_url", app_url.trim_end_matches('/').to_string()),
    ];

    RenderedEmail {
        to: to_email.to_string(),
        subject: format!("New application for {}", job_title),
        html: render_template(JOB_APPLICATION_TEMPLATE, &placeholders),
        text: format!(
            "Hi {},\n\n{} applied to your job \"{}\".",
            username, applicant, job_title
        ),
    }
}
