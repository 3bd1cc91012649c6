//! End-to-end tests driving a real server over TCP.
//!
//! Each test binds its own server on an ephemeral port, runs the event
//! loop on a background thread, and talks to it with a plain blocking
//! client socket.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use emberkv::{Config, Server};

fn start_server(arena_capacity: usize) -> SocketAddr {
    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        arena_capacity,
    };
    let mut server = Server::bind(&config).expect("failed to bind test server");
    let addr = server.local_addr();
    thread::spawn(move || {
        let _ = server.run();
    });
    addr
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    stream
}

fn read_response(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).expect("failed to read response");
    buf
}

/// Reads until the peer closes or the timeout fires; returns what arrived.
fn read_until_close(stream: &mut TcpStream) -> Vec<u8> {
    let mut collected = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => return collected,
            Ok(n) => collected.extend_from_slice(&chunk[..n]),
            Err(_) => return collected,
        }
    }
}

#[test]
fn test_set_then_get() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$3\r\nval\r\n*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n")
        .unwrap();

    assert_eq!(read_response(&mut client, 14), b"+OK\r\n$3\r\nval\r\n");
}

#[test]
fn test_get_missing_key() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(b"*2\r\n$3\r\nGET\r\n$4\r\nnope\r\n")
        .unwrap();

    assert_eq!(read_response(&mut client, 5), b"$-1\r\n");
}

#[test]
fn test_ping_with_and_without_argument() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nPING\r\n$2\r\nhi\r\n")
        .unwrap();

    assert_eq!(read_response(&mut client, 15), b"+PONG\r\n$2\r\nhi\r\n");
}

#[test]
fn test_unknown_command() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client.write_all(b"*1\r\n$3\r\nBAD\r\n").unwrap();

    let response = read_response(&mut client, 4);
    assert_eq!(&response, b"-ERR");
}

#[test]
fn test_command_split_across_two_writes() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client.write_all(b"*3\r\n$3\r\nSET\r\n").unwrap();
    thread::sleep(Duration::from_millis(50));
    client.write_all(b"$1\r\nk\r\n$1\r\nv\r\n").unwrap();

    assert_eq!(read_response(&mut client, 5), b"+OK\r\n");
}

#[test]
fn test_overwrite() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(
            b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\na\r\n\
              *3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\nbb\r\n\
              *2\r\n$3\r\nGET\r\n$1\r\nk\r\n",
        )
        .unwrap();

    assert_eq!(read_response(&mut client, 18), b"+OK\r\n+OK\r\n$2\r\nbb\r\n");
}

#[test]
fn test_pipelined_commands_answered_in_order() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(
            b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n\
              *3\r\n$3\r\nSET\r\n$2\r\nk2\r\n$2\r\nv2\r\n\
              *2\r\n$3\r\nGET\r\n$2\r\nk1\r\n\
              *2\r\n$3\r\nGET\r\n$2\r\nk2\r\n",
        )
        .unwrap();

    assert_eq!(
        read_response(&mut client, 26),
        b"+OK\r\n+OK\r\n$2\r\nv1\r\n$2\r\nv2\r\n"
    );
}

#[test]
fn test_quit_closes_after_reply() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nQUIT\r\n*1\r\n$4\r\nPING\r\n")
        .unwrap();

    // The reply to the second PING is never sent; the connection closes
    // after the QUIT acknowledgement is flushed.
    let collected = read_until_close(&mut client);
    assert_eq!(&collected, b"+PONG\r\n+OK\r\n");
}

#[test]
fn test_arena_exhaustion_keeps_connection_open() {
    let addr = start_server(16);
    let mut client = connect(addr);

    client
        .write_all(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$32\r\nAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\r\n")
        .unwrap();
    assert_eq!(read_response(&mut client, 20), b"-ERR out of memory\r\n");

    // The failure was per-command; the connection still serves requests.
    client.write_all(b"*1\r\n$4\r\nPING\r\n").unwrap();
    assert_eq!(read_response(&mut client, 7), b"+PONG\r\n");
}

#[test]
fn test_oversized_command_tears_connection_down() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    // A single command frame larger than the receive buffer can never be
    // parsed; the server must drop the connection.
    let big_value = vec![b'x'; 8192];
    let mut frame = Vec::new();
    frame.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$3\r\nbig\r\n$8192\r\n");
    frame.extend_from_slice(&big_value);
    frame.extend_from_slice(b"\r\n");

    // The write itself may fail once the server resets the connection.
    let _ = client.write_all(&frame);

    let collected = read_until_close(&mut client);
    assert!(collected.is_empty());
}

#[test]
fn test_empty_command_array() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client.write_all(b"*0\r\n").unwrap();

    assert_eq!(read_response(&mut client, 20), b"-ERR empty command\r\n");
}

#[test]
fn test_del_exists_dbsize() {
    let addr = start_server(1024 * 1024);
    let mut client = connect(addr);

    client
        .write_all(
            b"*3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n\
              *2\r\n$6\r\nEXISTS\r\n$1\r\na\r\n\
              *2\r\n$3\r\nDEL\r\n$1\r\na\r\n\
              *1\r\n$6\r\nDBSIZE\r\n",
        )
        .unwrap();

    assert_eq!(read_response(&mut client, 17), b"+OK\r\n:1\r\n:1\r\n:0\r\n");
}

#[test]
fn test_two_clients_are_independent() {
    let addr = start_server(1024 * 1024);
    let mut first = connect(addr);
    let mut second = connect(addr);

    first
        .write_all(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\nhello\r\n")
        .unwrap();
    assert_eq!(read_response(&mut first, 5), b"+OK\r\n");

    // Data written by one client is visible to the other; tearing one
    // down does not affect the other.
    second
        .write_all(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n")
        .unwrap();
    assert_eq!(read_response(&mut second, 11), b"$5\r\nhello\r\n");

    drop(first);
    second.write_all(b"*1\r\n$4\r\nPING\r\n").unwrap();
    assert_eq!(read_response(&mut second, 7), b"+PONG\r\n");
}
