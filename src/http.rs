use std::thread;
use std::time::Duration;

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

pub(crate) fn get_text_with_retries(
    url: &str,
    headers: &[(String, String)],
    connect_timeout: Duration,
    read_timeout: Duration,
    attempts: usize,
    retry_delay: Duration,
) -> Result<String, String> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .timeout_write(read_timeout)
            .build();

        let mut request = agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        match request.call() {
            Ok(response) => match response.into_string() {
                Ok(body) => return Ok(body),
                Err(err) => {
                    return Err(format!("request failed: response decode failed: {err}"));
                }
            },
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                let body = response_body.trim();
                let status_error = if body.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    let truncated = body.chars().take(240).collect::<String>();
                    format!("HTTP status {status} ({truncated})")
                };

                if should_retry_http_status(status) && attempt < attempts {
                    thread::sleep(retry_delay);
                    continue;
                }

                if should_retry_http_status(status) {
                    return Err(format!(
                        "request failed after {attempts} attempt(s): {status_error}"
                    ));
                }

                return Err(format!("request failed: {status_error}"));
            }
            Err(ureq::Error::Transport(err)) => {
                let transport_error = format!("transport error: {err}");
                if attempt < attempts {
                    thread::sleep(retry_delay);
                    continue;
                }
                return Err(format!(
                    "request failed after {attempts} attempt(s): {transport_error}"
                ));
            }
        }
    }

    Err("request failed: exhausted attempts without a concrete error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    struct TestServer {
        base_url: String,
        request_heads: Arc<Mutex<Vec<String>>>,
        shutdown_tx: mpsc::Sender<()>,
        join_handle: Option<std::thread::JoinHandle<()>>,
    }

    impl TestServer {
        fn spawn(responses: Vec<(u16, String)>) -> Self {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
            listener.set_nonblocking(true).expect("set nonblocking");
            let addr = listener.local_addr().expect("local addr");

            let request_heads = Arc::new(Mutex::new(Vec::new()));
            let heads_clone = Arc::clone(&request_heads);
            let shared_responses = Arc::new(Mutex::new(VecDeque::from(responses)));
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

            let join_handle = std::thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    match listener.accept() {
                        Ok((mut stream, _)) => {
                            let (status, body) = {
                                let mut queue = shared_responses.lock().expect("lock responses");
                                queue
                                    .pop_front()
                                    .unwrap_or_else(|| (200, "default-ok".to_string()))
                            };
                            let heads = Arc::clone(&heads_clone);
                            std::thread::spawn(move || {
                                if let Ok(head) = read_request_head(&mut stream) {
                                    heads.lock().expect("lock heads").push(head);
                                }
                                let _ = write_response(&mut stream, status, &body);
                            });
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                            std::thread::sleep(Duration::from_millis(5));
                        }
                        Err(_) => break,
                    }
                }
            });

            Self {
                base_url: format!("http://{addr}"),
                request_heads,
                shutdown_tx,
                join_handle: Some(join_handle),
            }
        }

        fn request_count(&self) -> usize {
            self.request_heads.lock().expect("lock heads").len()
        }

        fn first_request_head(&self) -> String {
            self.request_heads
                .lock()
                .expect("lock heads")
                .first()
                .cloned()
                .unwrap_or_default()
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.join_handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
        stream.set_read_timeout(Some(Duration::from_millis(200)))?;
        let mut buf = [0_u8; 1024];
        let mut data = Vec::new();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => {
                    data.extend_from_slice(&buf[..read]);
                    if data.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn reason_phrase(status: u16) -> &'static str {
        match status {
            200 => "OK",
            404 => "Not Found",
            429 => "Too Many Requests",
            503 => "Service Unavailable",
            _ => "Status",
        }
    }

    fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> std::io::Result<()> {
        let reason = reason_phrase(status);
        let payload = body.as_bytes();
        write!(
            stream,
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )?;
        stream.write_all(payload)?;
        stream.flush()
    }

    fn no_headers() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn retries_retryable_statuses_until_success() {
        let server = TestServer::spawn(vec![
            (503, "down".to_string()),
            (429, "throttled".to_string()),
            (200, "ok".to_string()),
        ]);

        let result = get_text_with_retries(
            &server.base_url,
            &no_headers(),
            Duration::from_millis(200),
            Duration::from_millis(200),
            3,
            Duration::from_millis(1),
        );

        assert_eq!(result.expect("should eventually succeed"), "ok");
        assert_eq!(server.request_count(), 3);
    }

    #[test]
    fn does_not_retry_hard_client_errors() {
        let server = TestServer::spawn(vec![(404, "not-found".to_string())]);

        let result = get_text_with_retries(
            &server.base_url,
            &no_headers(),
            Duration::from_millis(200),
            Duration::from_millis(200),
            5,
            Duration::from_millis(1),
        );

        let err = result.expect_err("404 should not be retried");
        assert!(
            err.contains("HTTP status 404"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn forwards_configured_headers() {
        let server = TestServer::spawn(vec![(200, "ok".to_string())]);
        let headers = vec![
            ("apikey".to_string(), "secret-key".to_string()),
            ("Authorization".to_string(), "Bearer secret-key".to_string()),
        ];

        let result = get_text_with_retries(
            &server.base_url,
            &headers,
            Duration::from_millis(200),
            Duration::from_millis(200),
            1,
            Duration::from_millis(1),
        );

        assert_eq!(result.expect("request should succeed"), "ok");
        let head = server.first_request_head().to_lowercase();
        assert!(head.contains("apikey: secret-key"), "missing apikey: {head}");
        assert!(
            head.contains("authorization: bearer secret-key"),
            "missing authorization: {head}"
        );
    }

    #[test]
    fn returns_retry_exhausted_error_for_retryable_status() {
        let server = TestServer::spawn(vec![
            (503, "down".to_string()),
            (503, "still-down".to_string()),
        ]);

        let result = get_text_with_retries(
            &server.base_url,
            &no_headers(),
            Duration::from_millis(200),
            Duration::from_millis(200),
            2,
            Duration::from_millis(1),
        );

        let err = result.expect_err("retryable failures should eventually error");
        assert!(
            err.contains("after 2 attempt(s)") && err.contains("HTTP status 503"),
            "unexpected error message: {err}"
        );
        assert_eq!(server.request_count(), 2);
    }
}
