#![cfg(feature = "cli")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use minidsp_frame::{decode_frame, Frame};

type Responder = fn(&[u8]) -> Option<Vec<u8>>;

/// A device on a TCP socket, as a proxy would expose it.
struct FakeDevice {
    port: u16,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeDevice {
    fn spawn(respond: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("fake device should bind");
        let port = listener
            .local_addr()
            .expect("fake device should have an address")
            .port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                serve(stream, respond, &log);
            }
        });

        Self { port, received }
    }

    fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().expect("log lock").clone()
    }

    fn opt(&self) -> String {
        format!("host=127.0.0.1,port={}", self.port)
    }
}

fn serve(mut stream: TcpStream, respond: Responder, log: &Mutex<Vec<Vec<u8>>>) {
    let mut buf = BytesMut::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        while let Ok(Some(frame)) = decode_frame(&mut buf) {
            log.lock().expect("log lock").push(frame.payload.to_vec());
            if let Some(reply) = respond(&frame.payload) {
                let wire = Frame::new(reply).to_bytes().expect("reply should encode");
                if stream.write_all(&wire).is_err() {
                    return;
                }
            }
        }
    }
}

fn levels_reply() -> Vec<u8> {
    let mut reply = vec![0x14, 0x00, 0x44];
    reply.extend_from_slice(&(-12.0f32).to_le_bytes());
    reply.extend_from_slice(&(-127.0f32).to_le_bytes());
    reply
}

fn healthy(payload: &[u8]) -> Option<Vec<u8>> {
    match payload {
        [0x05, 0xFF, 0xDA, 0x02] => Some(vec![0x05, 0xFF, 0xDA, 40, 0]),
        [0x05, 0xFF, 0xD9, 0x01] => Some(vec![0x05, 0xFF, 0xD9, 0x01]),
        [0x14, 0x00, 0x44, 0x02] => Some(levels_reply()),
        [opcode, ..] => Some(vec![*opcode, 0x00]),
        [] => None,
    }
}

/// Never answers the configuration state read.
fn stalls_on_config(payload: &[u8]) -> Option<Vec<u8>> {
    match payload {
        [0x05, 0xFF, 0xE0, 0x01] => None,
        other => healthy(other),
    }
}

fn minidsp(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minidsp"))
        .arg("--log-level")
        .arg("off")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("minidsp should run")
}

fn unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("ephemeral port should be available")
        .port()
}

#[test]
fn status_reports_volume_mute_and_source() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&["--transport", "net", "--opt", &device.opt(), "--format", "json", "status"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status should print JSON");
    assert_eq!(json["volume_db"], -20.0);
    assert_eq!(json["muted"], false);
    assert_eq!(json["source"], "toslink");
}

#[test]
fn gain_sends_doubled_attenuation() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&["-t", "net", "-o", &device.opt(), "gain", "-20"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(device.received(), vec![vec![0x42, 40]]);
}

#[test]
fn mute_without_argument_mutes() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&["-t", "net", "-o", &device.opt(), "mute"]);
    assert_eq!(output.status.code(), Some(0));

    let output = minidsp(&["-t", "net", "-o", &device.opt(), "mute", "off"]);
    assert_eq!(output.status.code(), Some(0));

    assert_eq!(device.received(), vec![vec![0x17, 0x01], vec![0x17, 0x00]]);
}

#[test]
fn input_selects_source_by_name() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&["-t", "net", "-o", &device.opt(), "input", "USB"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(device.received(), vec![vec![0x34, 0x02]]);
}

#[test]
fn input_gain_sets_both_inputs_in_order() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&["-t", "net", "-o", &device.opt(), "input-gain", "-6"]);

    assert_eq!(output.status.code(), Some(0));
    let received = device.received();
    assert_eq!(received.len(), 2);
    assert_eq!(&received[0][..4], &[0x13, 0x80, 0x00, 0x1A]);
    assert_eq!(&received[1][..4], &[0x13, 0x80, 0x00, 0x1B]);
    assert_eq!(&received[0][4..], &(-6.0f32).to_le_bytes());
}

#[test]
fn config_stops_when_a_step_times_out() {
    let device = FakeDevice::spawn(stalls_on_config);
    let output = minidsp(&[
        "-t", "net", "-o", &device.opt(), "--timeout", "200ms", "config", "1",
    ]);

    assert_eq!(output.status.code(), Some(124));
    assert_eq!(
        device.received(),
        vec![
            vec![0x25, 0x01, 0x01],
            vec![0x05, 0xFF, 0xE5, 0x01],
            vec![0x05, 0xFF, 0xE0, 0x01],
        ]
    );
}

#[test]
fn monitor_prints_requested_number_of_readings() {
    let device = FakeDevice::spawn(healthy);
    let output = minidsp(&[
        "-t", "net", "-o", &device.opt(), "--format", "json", "monitor", "--count", "3",
        "--interval", "10ms",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).expect("stdout should be UTF-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("line should be JSON");
    assert_eq!(first["input1"], -12.0);
    assert_eq!(first["input2"], -127.0);
}

#[test]
fn out_of_range_gain_is_usage_error_without_connecting() {
    let output = minidsp(&["-t", "net", "-o", &format!("port={}", unused_port()), "gain", "6"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn unknown_source_is_usage_error() {
    let output = minidsp(&["-t", "net", "input", "phono"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn devices_over_net_is_unsupported() {
    let output = minidsp(&["--transport", "net", "devices"]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not supported"), "stderr: {stderr}");
}

#[test]
fn refused_connection_is_transport_error() {
    let output = minidsp(&["-t", "net", "-o", &format!("port={}", unused_port()), "status"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unknown_transport_option_is_usage_error() {
    let output = minidsp(&["-t", "net", "-o", "baud=9600", "status"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn proxy_relays_between_client_and_device() {
    let device = FakeDevice::spawn(healthy);
    let proxy_port = unused_port();
    let bind = format!("127.0.0.1:{proxy_port}");

    let mut child = Command::new(env!("CARGO_BIN_EXE_minidsp"))
        .args(["--log-level", "off", "-t", "net", "-o", &device.opt()])
        .args(["proxy", "--bind", &bind])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("proxy should start");

    let start = Instant::now();
    let mut client = loop {
        match TcpStream::connect(&bind) {
            Ok(stream) => break stream,
            Err(err) => {
                assert!(
                    start.elapsed() < Duration::from_secs(5),
                    "proxy did not come up: {err}"
                );
                thread::sleep(Duration::from_millis(25));
            }
        }
    };
    client
        .set_read_timeout(Some(Duration::from_secs(3)))
        .expect("read timeout should be settable");

    let request = Frame::command(0x05, &[0xFF, 0xDA, 0x02]).to_bytes().expect("encode");
    client.write_all(&request).expect("request should send");

    let expected = Frame::new(vec![0x05, 0xFF, 0xDA, 40, 0]).to_bytes().expect("encode");
    let mut response = vec![0u8; expected.len()];
    client.read_exact(&mut response).expect("response should arrive");
    assert_eq!(response, expected.to_vec());

    // The remote command went through to the device untouched.
    assert_eq!(device.received(), vec![vec![0x05, 0xFF, 0xDA, 0x02]]);

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn version_prints_package_version() {
    let output = minidsp(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("minidsp {}", env!("CARGO_PKG_VERSION")));
}
