// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! These tests run the full request pipeline against a local HTTP server,
//! with both transports.

#[cfg(test)]
mod test {
    use httptest::matchers::*;
    use httptest::{Expectation, Server, all_of, cycle, responders::*};
    use runtime::backoff_strategy::FixedDelayBackoff;
    use runtime::client::HttpPipelineClient;
    use runtime::client_config::ClientConfig;
    use runtime::content::BytesContent;
    use runtime::context::RequestExecutionContext;
    use runtime::request::Request;
    use runtime::response_handler::{JsonErrorResponseHandler, JsonResponseHandler};
    use runtime::retry_policy::RetryPolicyBuilder;
    use runtime::stages::{INVOCATION_ID_HEADER, RETRY_HEADER};
    use sdk_http_client::{ReqwestAsyncHttpClient, ReqwestHttpClient};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use test_case::test_case;

    type TestResult = anyhow::Result<()>;

    #[derive(Clone, Copy, Debug)]
    enum Transport {
        Sync,
        Async,
    }

    fn client(transport: Transport) -> anyhow::Result<HttpPipelineClient> {
        client_with_config(transport, ClientConfig::new())
    }

    fn client_with_config(
        transport: Transport,
        config: ClientConfig,
    ) -> anyhow::Result<HttpPipelineClient> {
        let builder = HttpPipelineClient::builder(config);
        let builder = match transport {
            Transport::Sync => builder.with_http_client(Arc::new(ReqwestHttpClient::new())),
            Transport::Async => {
                builder.with_async_http_client(Arc::new(ReqwestAsyncHttpClient::new()))
            }
        };
        Ok(builder.build()?)
    }

    async fn call(
        transport: Transport,
        client: &HttpPipelineClient,
        request: Request,
    ) -> runtime::Result<Value> {
        let context = RequestExecutionContext::builder().build();
        let handler = Arc::new(JsonResponseHandler::<Value>::new());
        let error_handler = Arc::new(JsonErrorResponseHandler::new().with_service_name("test"));
        match transport {
            Transport::Sync => client.execute(request, context, handler, error_handler).await,
            Transport::Async => {
                client
                    .execute_async(request, context, handler, error_handler)
                    .await
            }
        }
    }

    #[test_case(Transport::Sync)]
    #[test_case(Transport::Async)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn retry_then_success(transport: Transport) -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/items"),
                request::headers(contains(key(INVOCATION_ID_HEADER))),
                request::headers(contains((RETRY_HEADER, "0/0/500"))),
                request::body("payload"),
            ])
            .respond_with(status_code(503).body(r#"{"__type": "ServiceUnavailable"}"#)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/v1/items"),
                request::headers(contains((RETRY_HEADER, matches("^1/[0-9]+/495$")))),
                request::body("payload"),
            ])
            .respond_with(json_encoded(json!({"name": "item-1"}))),
        );

        let client = client(transport)?;
        let request = Request::new("test", http::Method::POST, server.url_str("/").parse()?)
            .set_resource_path("/v1/items")
            .set_content(BytesContent::shared("payload"));
        let got = call(transport, &client, request).await?;
        assert_eq!(got, json!({"name": "item-1"}));
        assert_eq!(
            client.dependencies().retry_capacity().available_capacity(),
            Some(500)
        );
        Ok(())
    }

    #[test_case(Transport::Sync)]
    #[test_case(Transport::Async)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn service_error(transport: Transport) -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/v1/items/missing"))
                .times(1)
                .respond_with(
                    status_code(404)
                        .insert_header("x-amzn-requestid", "req-123")
                        .body(r#"{"__type": "com.example#ResourceNotFoundException", "message": "no such item"}"#),
                ),
        );

        let client = client(transport)?;
        let request = Request::new("test", http::Method::GET, server.url_str("/").parse()?)
            .set_resource_path("/v1/items/missing");
        let err = call(transport, &client, request).await.unwrap_err();
        assert_eq!(err.http_status_code(), Some(404), "{err:?}");
        assert_eq!(err.error_code(), Some("ResourceNotFoundException"));
        assert_eq!(err.request_id(), Some("req-123"));
        Ok(())
    }

    #[test_case(Transport::Sync)]
    #[test_case(Transport::Async)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn throttled_until_exhausted(transport: Transport) -> TestResult {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/v1/items"))
                .times(4)
                .respond_with(cycle![
                    status_code(429).body("{}"),
                    status_code(429).body("{}"),
                    status_code(429).body("{}"),
                    status_code(429).body("{}"),
                ]),
        );

        let policy = RetryPolicyBuilder::new()
            .with_backoff_strategy(FixedDelayBackoff::new(Duration::from_millis(1)))
            .build();
        let client = client_with_config(transport, ClientConfig::new().set_retry_policy(policy))?;
        let request = Request::new("test", http::Method::GET, server.url_str("/").parse()?)
            .set_resource_path("/v1/items");
        let err = call(transport, &client, request).await.unwrap_err();
        assert!(err.is_throttling(), "{err:?}");
        // Throttling errors do not consume retry capacity.
        assert_eq!(
            client.dependencies().retry_capacity().available_capacity(),
            Some(500)
        );
        Ok(())
    }
}
