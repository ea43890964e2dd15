// --- CONSTANTS ---
#[allow(dead_code)]
pub const TOKEN: &str = "SOME_TOKEN";
#[allow(dead_code)]
pub const TOKEN_HEADER: &str = "X-API-Token";
#[allow(dead_code)]
pub const FROM: &str = "FROM";
#[allow(dead_code)]
pub const TO: &str = "TO";
#[allow(dead_code)]
pub const WEBHOOK_URL: &str = "https://my-webhook.com";
#[allow(dead_code)]
pub const SUBSCRIPTION_ID: &str = "SOME_SUBSCRIPTION_ID";
#[allow(dead_code)]
pub const TEMPLATE_ID: &str = "SOME_TEMPLATE_ID";

// --- TEST SETUP MACRO ---

// Starts a mock server and a client pointed at it, then runs the body.
#[macro_export]
macro_rules! setup {
    (
        $async:ident $fn:ident $name:ident($server:ident: _, $client:ident: _) $body:block
    ) => {
        #[tokio::test]
        $async $fn $name() {
            let $server = wiremock::MockServer::start().await;
            let $client = zenvia::Client::builder()
                .token($crate::common::TOKEN)
                .base_url($server.uri())
                .build()
                .unwrap();

            $body
        }
    };
}

/// The JSON error body the platform sends with a `400`.
#[allow(dead_code)]
pub fn validation_error(message: &str) -> serde_json::Value {
    serde_json::json!({
        "code": "VALIDATION_ERROR",
        "message": message,
    })
}
