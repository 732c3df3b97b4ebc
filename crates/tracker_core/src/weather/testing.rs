use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

/// Answers exactly one HTTP request with `status` and a JSON `body`.
/// The handle yields the request line that was received.
pub(crate) fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            let read = reader.read_line(&mut header).unwrap();
            if read == 0 || header == "\r\n" {
                break;
            }
        }

        reader.get_mut().write_all(response.as_bytes()).unwrap();
        reader.get_mut().flush().unwrap();
        request_line.trim_end().replace("%2C", ",")
    });

    (format!("http://{addr}/forecast"), handle)
}

/// A URL on a port nothing listens on.
pub(crate) fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/forecast")
}
