use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Form;
use floodnet_pipeline::Ingestion;
use lazy_static::lazy_static;
use serde::Deserialize;

lazy_static! {
    static ref CLIENT: reqwest::Client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("reqwest Client");
}

/// Inbound message webhook payload, reduced to the fields we read
#[derive(Deserialize, utoipa::ToSchema)]
pub struct WhatsAppInbound {
    /// First media attachment, when the sender attached a photo
    #[serde(rename = "MediaUrl0")]
    media_url: Option<String>,
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// TwiML reply telling the messaging gateway what to answer
fn twiml(message: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml")],
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
            xml_escape(message)
        ),
    )
        .into_response()
}

/// WhatsApp intake webhook
///
/// Citizens can forward a photo over WhatsApp; the verification gate
/// triages it and the reply confirms or rejects the sighting. No
/// report row is created here, the message carries no coordinates.
#[utoipa::path(
    post,
    path = "/webhooks/whatsapp",
    request_body(content_type = "application/x-www-form-urlencoded", content = WhatsAppInbound),
    responses(
        (status = 200, description = "TwiML reply")
    )
)]
pub async fn whatsapp_inbound(
    State(ingestion): State<Arc<Ingestion>>,
    Form(inbound): Form<WhatsAppInbound>,
) -> Response {
    let Some(media_url) = inbound.media_url else {
        return twiml("Please send a photo of the flood.");
    };

    let image = match CLIENT.get(&media_url).send().await {
        Ok(response) => match response.bytes().await {
            Ok(bytes) => bytes,
            Err(_) => return twiml("Could not read your photo, please try again."),
        },
        Err(_) => return twiml("Could not read your photo, please try again."),
    };

    let result = ingestion.verify_evidence(&image).await;

    if result.verified {
        twiml(&format!(
            "🚨 FLOOD CONFIRMED\n\nAnalysis: {}\n\nTeam sent.",
            result.reason
        ))
    } else {
        twiml(&format!("❌ REPORT REJECTED\n\nReason: {}", result.reason))
    }
}
