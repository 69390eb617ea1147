//! A minimal in-process RESP server used as a benchmark target in the
//! integration tests below. It understands just enough of the protocol to
//! answer every command `kvperf` can issue.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use kvperf::codec::{Reply, ReplyParser};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct Store {
    strings: HashMap<Vec<u8>, Vec<u8>>,
    lists: HashMap<Vec<u8>, VecDeque<Vec<u8>>>,
    hashes: HashMap<Vec<u8>, HashMap<Vec<u8>, Vec<u8>>>,
}

pub struct StubServer {
    pub addr: SocketAddr,
}

/// Bind a stub server to an ephemeral port and start accepting connections
/// in the background. Each connection is handled by its own task; all
/// connections share one `Store` so `SET` from one client is visible to a
/// `GET` from another.
pub async fn spawn() -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
    let addr = listener.local_addr().expect("local_addr");
    let store = Arc::new(Mutex::new(Store::default()));

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => return,
            };
            tokio::spawn(handle_connection(stream, store.clone()));
        }
    });

    StubServer { addr }
}

async fn handle_connection(mut stream: TcpStream, store: Arc<Mutex<Store>>) {
    let mut parser = ReplyParser::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let reply = match parser.feed(&buf[..n]) {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(_) => return,
        };
        parser = ReplyParser::new();

        let args = match reply {
            Reply::MultiBulk(Some(items)) => items.into_iter().flatten().collect::<Vec<Bytes>>(),
            _ => return,
        };
        let response = dispatch(&args, &store);
        if stream.write_all(&response).await.is_err() {
            return;
        }
    }
}

fn dispatch(args: &[Bytes], store: &Mutex<Store>) -> Vec<u8> {
    let Some(cmd) = args.first() else {
        return status_err("ERR empty command");
    };
    let mut store = store.lock().unwrap();

    match cmd.as_ref() {
        b"SET" => {
            let (Some(key), Some(val)) = (args.get(1), args.get(2)) else {
                return status_err("ERR wrong number of arguments");
            };
            store.strings.insert(key.to_vec(), val.to_vec());
            status_ok()
        }
        b"GET" => {
            let Some(key) = args.get(1) else {
                return status_err("ERR wrong number of arguments");
            };
            match store.strings.get(key.as_ref()) {
                Some(val) => bulk(val),
                None => nil_bulk(),
            }
        }
        b"DEL" => {
            let removed = args[1..]
                .iter()
                .filter(|k| store.strings.remove(k.as_ref()).is_some())
                .count();
            integer(removed as i64)
        }
        b"LPUSH" => {
            let (Some(key), Some(val)) = (args.get(1), args.get(2)) else {
                return status_err("ERR wrong number of arguments");
            };
            let list = store.lists.entry(key.to_vec()).or_default();
            list.push_front(val.to_vec());
            integer(list.len() as i64)
        }
        b"LPOP" => {
            let Some(key) = args.get(1) else {
                return status_err("ERR wrong number of arguments");
            };
            match store.lists.get_mut(key.as_ref()).and_then(|l| l.pop_front()) {
                Some(val) => bulk(&val),
                None => nil_bulk(),
            }
        }
        b"HSET" => {
            let (Some(key), Some(field), Some(val)) = (args.get(1), args.get(2), args.get(3))
            else {
                return status_err("ERR wrong number of arguments");
            };
            let existed = store
                .hashes
                .entry(key.to_vec())
                .or_default()
                .insert(field.to_vec(), val.to_vec())
                .is_some();
            integer(if existed { 0 } else { 1 })
        }
        b"HGET" => {
            let (Some(key), Some(field)) = (args.get(1), args.get(2)) else {
                return status_err("ERR wrong number of arguments");
            };
            match store.hashes.get(key.as_ref()).and_then(|h| h.get(field.as_ref())) {
                Some(val) => bulk(val),
                None => nil_bulk(),
            }
        }
        b"HGETALL" => {
            let Some(key) = args.get(1) else {
                return status_err("ERR wrong number of arguments");
            };
            match store.hashes.get(key.as_ref()) {
                Some(h) => {
                    let mut items: Vec<&[u8]> = Vec::with_capacity(h.len() * 2);
                    for (field, val) in h {
                        items.push(field);
                        items.push(val);
                    }
                    multi_bulk(&items)
                }
                None => multi_bulk(&[]),
            }
        }
        b"DEBUG" => status_ok(),
        _ => status_err("ERR unknown command"),
    }
}

fn status_ok() -> Vec<u8> {
    b"+OK\r\n".to_vec()
}

fn status_err(msg: &str) -> Vec<u8> {
    format!("-{msg}\r\n").into_bytes()
}

fn integer(n: i64) -> Vec<u8> {
    format!(":{n}\r\n").into_bytes()
}

fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

fn nil_bulk() -> Vec<u8> {
    b"$-1\r\n".to_vec()
}

fn multi_bulk(items: &[&[u8]]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend_from_slice(&bulk(item));
    }
    out
}
