use std::{
    io::{Read, Write},
    net::TcpListener,
    thread::{self, JoinHandle},
};
use url::Url;

/// Serve a single canned HTTP response, returning the raw request.
pub fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let mut req = Vec::new();
        let mut buf = [0; 1024];

        let head_len = loop {
            let n = stream.read(&mut buf).unwrap();
            req.extend_from_slice(&buf[..n]);
            if let Some(pos) = req.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&req[..head_len]).to_lowercase();
        let content_len: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|len| len.trim().parse().unwrap())
            .unwrap_or(0);

        while req.len() < head_len + content_len {
            let n = stream.read(&mut buf).unwrap();
            req.extend_from_slice(&buf[..n]);
        }

        let res = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(res.as_bytes()).unwrap();
        stream.flush().unwrap();

        String::from_utf8(req).unwrap()
    });

    (url, handle)
}
