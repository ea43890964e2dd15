mod common;

use common::*;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, ResponseTemplate,
};
use zenvia::{
    channel::Channel,
    error::Error,
    message::{
        Contact, ContactName, ContactPhone, Content, FileContent, Location, TemplateContent,
    },
    Client,
};

async fn mock_echo(mock_server: &wiremock::MockServer, channel: &str, expected: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/channels/{channel}/messages")))
        .and(header(TOKEN_HEADER, TOKEN))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected))
        .expect(1)
        .mount(mock_server)
        .await;
}

setup! {
    async fn test_sms_text_message(mock_server: _, client: _) {
        // Arrange
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{"type": "text", "text": "some text message"}]
        });
        mock_echo(&mock_server, "sms", expected.clone()).await;

        // Act
        let response = client
            .channel(Channel::Sms)
            .send_message(FROM, TO, [Content::text("some text message")])
            .unwrap()
            .await
            .unwrap();

        // Assert
        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_sms_rejects_everything_but_text(mock_server: _, client: _) {
        let sms = client.channel(Channel::Sms);

        let contents: [(&str, Content); 5] = [
            ("template", TemplateContent::new("templateId").into()),
            ("file", FileContent::new("http://server.com/file.jpeg", "image/jpeg").into()),
            ("location", Location::new(-46.511170, -23.442930).into()),
            ("contacts", Content::contacts([Contact::default()])),
            ("json", Content::json(json!({"key": "value"}))),
        ];

        for (kind, content) in contents {
            let err = sms.send_message(FROM, TO, [content]).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Content of type {kind} is not supported in SMS channel")
            );
        }

        // Nothing reached the network
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}

setup! {
    async fn test_facebook_text_and_file(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [
                {"type": "text", "text": "some text message"},
                {
                    "type": "file",
                    "fileUrl": "http://server.com/file.jpeg",
                    "fileMimeType": "image/jpeg",
                    "fileCaption": "some file caption"
                }
            ]
        });
        mock_echo(&mock_server, "facebook", expected.clone()).await;

        let response = client
            .channel(Channel::Facebook)
            .send_message(
                FROM,
                TO,
                [
                    Content::text("some text message"),
                    FileContent::new("http://server.com/file.jpeg", "image/jpeg")
                        .caption("some file caption")
                        .into(),
                ],
            )
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_facebook_reports_first_unsupported_content(mock_server: _, client: _) {
        let err = client
            .channel(Channel::Facebook)
            .send_message(
                FROM,
                TO,
                [Content::text("some text message"), Content::template("templateId")],
            )
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Content of type template is not supported in Facebook channel"
        );
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}

setup! {
    async fn test_whatsapp_text_message(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{"type": "text", "text": "some text message"}]
        });
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, ["some text message"])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_whatsapp_file_message(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{
                "type": "file",
                "fileUrl": "http://server.com/file.pdf",
                "fileMimeType": "application/pdf",
                "fileCaption": "some file caption",
                "fileName": "file.pdf"
            }]
        });
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        let content = FileContent::new("http://server.com/file.pdf", "application/pdf")
            .caption("some file caption")
            .file_name("file.pdf");
        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [content])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_inbound_contents_are_echoed_with_extra_fields(mock_server: _, client: _) {
        let content = json!({
            "type": "file",
            "fileUrl": "http://server.com/audio.ogg",
            "fileMimeType": "audio/ogg",
            "fileSize": 4096
        });
        let expected = json!({"from": FROM, "to": TO, "contents": [content.clone()]});
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        // As received in a webhook event, sent back unchanged
        let content: Content = serde_json::from_value(content).unwrap();
        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [content])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_malformed_content_is_rejected_locally(mock_server: _, client: _) {
        let content: Content = serde_json::from_value(json!({"type": "text"})).unwrap();

        let err = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [content])
            .unwrap_err();

        assert!(matches!(err, Error::MalformedContent { ref content_type } if content_type == "text"));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}

setup! {
    async fn test_whatsapp_template_message(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{
                "type": "template",
                "templateId": "templateId",
                "fields": {"fieldA": "value A", "fieldB": "value B"}
            }]
        });
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        let content = TemplateContent::new("templateId").fields([
            ("fieldA", "value A"),
            ("fieldB", "value B"),
        ]);
        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [content])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_whatsapp_location_message(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{
                "type": "location",
                "longitude": -46.51117,
                "latitude": -23.44293,
                "name": "Zenvia",
                "address": "Avenida Paulista, 2300",
                "url": "https://www.zenvia.com"
            }]
        });
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        let content = Location::new(-46.51117, -23.44293)
            .name("Zenvia")
            .address("Avenida Paulista, 2300")
            .url("https://www.zenvia.com");
        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [content])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_whatsapp_contacts_message(mock_server: _, client: _) {
        let expected = json!({
            "from": FROM,
            "to": TO,
            "contents": [{
                "type": "contacts",
                "contacts": [{
                    "name": {"formattedName": "John Smith", "firstName": "John"},
                    "phones": [{"phone": "+5511999999999", "type": "CELL"}]
                }]
            }]
        });
        mock_echo(&mock_server, "whatsapp", expected.clone()).await;

        let contact = Contact {
            name: Some(ContactName {
                formatted_name: "John Smith".into(),
                first_name: Some("John".into()),
                ..Default::default()
            }),
            phones: vec![ContactPhone {
                phone: "+5511999999999".into(),
                kind: Some("CELL".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let response = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [Content::contacts([contact])])
            .unwrap()
            .await
            .unwrap();

        assert_eq!(response, expected);
    }
}

setup! {
    async fn test_unsuccessful_request_keeps_error_body(mock_server: _, client: _) {
        // Arrange
        let error_body = validation_error(
            "Request has one or more errors\n  In body\n    Too few items in the array. Minimum of 1. Found 0 items",
        );
        Mock::given(method("POST"))
            .and(path("/v1/channels/whatsapp/messages"))
            .and(header(TOKEN_HEADER, TOKEN))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .mount(&mock_server)
            .await;

        // Act
        let err = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [Content::contacts([])])
            .unwrap()
            .await
            .unwrap_err();

        // Assert
        assert_eq!(err.to_string(), "Unsuccessful request");
        assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
        let Error::Request(request) = err else {
            panic!("expected a request error");
        };
        assert_eq!(request.message(), "Unsuccessful request");
        assert_eq!(request.body(), &error_body);
    }
}

setup! {
    async fn test_unknown_content_is_rejected_locally(mock_server: _, client: _) {
        let err = client
            .channel(Channel::Whatsapp)
            .send_message(FROM, TO, [Content::Unknown(json!({}))])
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Content of type undefined is not supported in WhatsApp channel"
        );
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}

#[test]
fn test_unsupported_channel() {
    let client = Client::new(TOKEN).unwrap();
    let err = client.get_channel("invalid").unwrap_err();
    assert_eq!(err.to_string(), "Unsupported channel");

    assert_eq!(
        client.get_channel("whatsapp").unwrap().channel(),
        Channel::Whatsapp
    );
}

#[test]
fn test_empty_message_is_rejected() {
    let client = Client::new(TOKEN).unwrap();
    let err = client
        .channel(Channel::Sms)
        .send_message(FROM, TO, Vec::<Content>::new())
        .unwrap_err();
    assert!(matches!(err, Error::EmptyMessage));
}

#[tokio::test]
async fn test_technical_error() {
    // Nothing listens on the discard port
    let client = Client::builder()
        .token(TOKEN)
        .base_url("http://127.0.0.1:9")
        .build()
        .unwrap();

    let err = client
        .channel(Channel::Sms)
        .send_message(FROM, TO, ["hello"])
        .unwrap()
        .await
        .unwrap_err();

    let Error::Technical(technical) = &err else {
        panic!("expected a technical error");
    };
    assert!(technical.message().starts_with("Error: "));
    assert!(std::error::Error::source(technical).is_some());
}
