// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod get;
mod post;
pub mod server;
mod state;
mod template;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;
    use serde_json::Value;
    use tokio::net::TcpStream;
    use tokio::spawn;
    use tokio::time::sleep;
    use tokio::time::timeout;

    use crate::catalog::builtin_catalog;
    use crate::concierge::recommender::Credential;
    use crate::config::Config;
    use crate::error::Fallible;
    use crate::web::server::ServerOptions;
    use crate::web::server::start_server;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.swipe.settle_delay = Duration::ZERO;
        config.concierge.canned_delay = Duration::from_millis(10);
        config
    }

    async fn start_test_server() -> String {
        let port = portpicker::pick_unused_port().unwrap();
        let options = ServerOptions {
            port,
            open_browser: false,
        };
        spawn(async move {
            start_server(builtin_catalog(), test_config(), Credential::Absent, options).await
        });
        let bind = format!("127.0.0.1:{port}");
        loop {
            if let Ok(stream) = TcpStream::connect(&bind).await {
                drop(stream);
                break;
            }
            sleep(Duration::from_millis(1)).await;
        }
        format!("http://{bind}")
    }

    async fn act(base: &str, action: &str) -> Fallible<String> {
        let response = reqwest::Client::new()
            .post(format!("{base}/"))
            .form(&[("action", action)])
            .send()
            .await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        Ok(response.text().await?)
    }

    async fn pointer(base: &str, phase: &str, x: &str, y: &str) -> Fallible<Value> {
        let response = reqwest::Client::new()
            .post(format!("{base}/pointer"))
            .form(&[("phase", phase), ("x", x), ("y", y)])
            .send()
            .await?;
        assert!(response.status().is_success());
        Ok(response.json().await?)
    }

    #[tokio::test]
    async fn test_start_server_with_empty_catalog() -> Fallible<()> {
        let options = ServerOptions {
            port: portpicker::pick_unused_port().unwrap(),
            open_browser: false,
        };
        let result = start_server(Vec::new(), test_config(), Credential::Absent, options).await;
        assert!(result.is_err());
        let err = result.err().unwrap();
        assert_eq!(err.to_string(), "error: catalog has no restaurants.");
        Ok(())
    }

    #[tokio::test]
    async fn test_e2e() -> Fallible<()> {
        let base = start_test_server().await;

        // Hit the `style.css` endpoint.
        let response = reqwest::get(format!("{base}/style.css")).await?;
        assert!(response.status().is_success());
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");

        // Hit the `script.js` endpoint.
        let response = reqwest::get(format!("{base}/script.js")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/javascript"
        );

        // Hit the not found endpoint.
        let response = reqwest::get(format!("{base}/herp-derp")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Hit the root endpoint.
        let response = reqwest::get(format!("{base}/")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        let html = response.text().await?;
        assert!(html.contains("0 / 5"));
        assert!(html.contains("Cục Gạch Quán"));

        // Swipe right with the button.
        let html = act(&base, "Right").await?;
        assert!(html.contains("1 / 5"));
        assert!(html.contains("Pizza 4P"));

        // The detail panel blocks swiping.
        let html = act(&base, "Details").await?;
        assert!(html.contains("CloseDetails"));
        let html = act(&base, "Left").await?;
        assert!(html.contains("1 / 5"));
        let html = act(&base, "CloseDetails").await?;
        assert!(!html.contains("CloseDetails"));

        // Drag the card past the threshold.
        let reply = pointer(&base, "down", "200", "300").await?;
        assert_eq!(reply["accepted"], true);
        let reply = pointer(&base, "move", "400", "300").await?;
        assert_eq!(reply["x"], 200.0);
        assert_eq!(reply["right"], 1.0);
        let reply = pointer(&base, "up", "400", "300").await?;
        assert_eq!(reply["resolved"], "right");
        let html = reqwest::get(format!("{base}/")).await?.text().await?;
        assert!(html.contains("2 / 5"));

        // A short drag springs back.
        pointer(&base, "down", "200", "300").await?;
        pointer(&base, "move", "230", "320").await?;
        let reply = pointer(&base, "up", "230", "320").await?;
        assert_eq!(reply["resolved"], Value::Null);
        assert_eq!(reply["x"], 0.0);

        // The update stream has moved on.
        let response = reqwest::get(format!("{base}/updates?after=0")).await?;
        let reply: Value = response.json().await?;
        assert!(reply["revision"].as_u64().unwrap() > 0);
        assert_eq!(reply["chat"], 0);

        // Run out of cards, then start over.
        act(&base, "Up").await?;
        act(&base, "Left").await?;
        let html = act(&base, "Right").await?;
        assert!(html.contains("You're all caught up!"));
        let html = act(&base, "Refresh").await?;
        assert!(html.contains("0 / 5"));
        assert!(!html.contains("You're all caught up!"));

        Ok(())
    }

    #[tokio::test]
    async fn test_chat() -> Fallible<()> {
        let base = start_test_server().await;

        // Messages are ignored while the chat is closed.
        let response = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .form(&[("message", "pho")])
            .send()
            .await?;
        assert!(response.status().is_success());

        let html = act(&base, "Chat").await?;
        assert!(html.contains("Foodin AI"));
        assert!(html.contains("hidden gems in Saigon"));
        assert!(!html.contains("<div class=\"message user\">"));
        let reply: Value = reqwest::get(format!("{base}/updates?after=0&chat=0"))
            .await?
            .json()
            .await?;
        let revision = reply["revision"].as_u64().unwrap();
        assert_eq!(reply["chat"], 0);

        let response = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .form(&[("message", "something cheesy")])
            .send()
            .await?;
        assert!(response.status().is_success());
        let html = response.text().await?;
        assert!(html.contains("something cheesy"));

        // The long-poll wakes up when the reply lands, not at its timeout.
        let wait = reqwest::get(format!("{base}/updates?after={revision}&chat=1"));
        let reply: Value = timeout(Duration::from_secs(5), wait)
            .await
            .unwrap()?
            .json()
            .await?;
        assert_eq!(reply["chat"], 2);
        assert_eq!(reply["revision"], revision);
        let html = reqwest::get(format!("{base}/")).await?.text().await?;
        assert!(!html.contains("Thinking..."));
        assert!(html.contains("<strong>Cục Gạch Quán</strong>"));

        // Closing and reopening keeps the log.
        let html = act(&base, "CloseChat").await?;
        assert!(!html.contains("something cheesy"));
        let html = act(&base, "Chat").await?;
        assert!(html.contains("something cheesy"));

        Ok(())
    }
}
