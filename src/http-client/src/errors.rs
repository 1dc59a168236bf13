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

use std::io::{Error, ErrorKind};

/// Converts transport errors to the I/O errors expected by the runtime.
///
/// The runtime retries any I/O error, the kind is informational.
pub(crate) fn to_io_error(e: reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        ErrorKind::TimedOut
    } else if e.is_connect() {
        ErrorKind::ConnectionRefused
    } else if e.is_body() || e.is_decode() {
        ErrorKind::UnexpectedEof
    } else {
        ErrorKind::Other
    };
    Error::new(kind, e)
}

/// The reason phrase for well-known status codes.
pub(crate) fn status_text(status: http::StatusCode) -> Option<String> {
    status.canonical_reason().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn status_text_known() {
        assert_eq!(status_text(StatusCode::OK).as_deref(), Some("OK"));
        assert_eq!(
            status_text(StatusCode::SERVICE_UNAVAILABLE).as_deref(),
            Some("Service Unavailable")
        );
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), None);
    }

    #[tokio::test]
    async fn connection_refused() -> anyhow::Result<()> {
        // Bind and drop a listener to find a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let address = listener.local_addr()?;
        drop(listener);
        let err = reqwest::Client::new()
            .get(format!("http://{address}/"))
            .send()
            .await
            .unwrap_err();
        let got = to_io_error(err);
        assert_eq!(got.kind(), ErrorKind::ConnectionRefused, "{got:?}");
        Ok(())
    }
}
