use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Ask the OS for a port that is free right now.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().unwrap().port()
}

/// A `faultlined` child process, killed on drop.
pub struct RunningServer {
    child: Child,
    pub base_url: String,
    pub agent: ureq::Agent,
}

impl RunningServer {
    pub fn start() -> Self {
        let port = free_port();
        let child = Command::new(env!("CARGO_BIN_EXE_faultlined"))
            .args(["--port", &port.to_string()])
            .env("FAULTLINE_LOG_LEVEL", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn faultlined");

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(5)))
            .build()
            .into();

        let server = Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            agent,
        };
        server.wait_ready(Duration::from_secs(10));
        server
    }

    fn wait_ready(&self, limit: Duration) {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if let Ok(resp) = self.agent.get(&format!("{}/health", self.base_url)).call()
                && resp.status().is_success()
            {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        panic!("faultlined did not become ready at {}", self.base_url);
    }

    pub fn get(&self, path: &str) -> (u16, serde_json::Value) {
        let resp = self
            .agent
            .get(&format!("{}{}", self.base_url, path))
            .call()
            .expect("GET failed");
        read(resp)
    }

    pub fn post(&self, path: &str) -> (u16, serde_json::Value) {
        let resp = self
            .agent
            .post(&format!("{}{}", self.base_url, path))
            .send_empty()
            .expect("POST failed");
        read(resp)
    }
}

fn read(mut resp: ureq::http::Response<ureq::Body>) -> (u16, serde_json::Value) {
    let status = resp.status().as_u16();
    let text = resp.body_mut().read_to_string().expect("read body");
    let json = serde_json::from_str(&text).expect("JSON body");
    (status, json)
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
