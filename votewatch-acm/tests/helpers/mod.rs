// Scripted vendor for session tests: `use helpers::*;`
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use url::Url;
use votewatch_acm::{AcmConnector, AcmTransport, HttpPage};
use votewatch_core::{Credentials, SessionConfig, VoteError};

pub const LOGIN_PAGE: &str = "/yna2025/login.php";
pub const LOGIN_ACTION: &str = "/yna2025/login_action.php";
pub const DATA: &str = "/yna2025/votesummary.php";
pub const HOME: &str = "/yna2025/index.php";

pub const LOGIN_FORM: &str = r#"<html><head><meta name="csrf-token" content="csrf-abc"></head>
<body><form action="login_action.php" method="post">
<input type="hidden" name="redirect" value="votesummary.php?tpid=4">
<input type="text" name="username"><input type="password" name="userpassword">
</form></body></html>"#;

pub const CHART_PAGE: &str = r#"<html><body>
<h3 class="card-header">The Best Couple</h3>
<canvas id="voteChart"></canvas>
<ul>
<li>YND01 : Force &amp; Book (My Love Mix-Up)</li>
<li>YND06 : Pond &amp; Phuwin (Fourever You)</li>
<li>YND09 : Gemini &amp; Fourth</li>
</ul>
<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
<script>
var ctx = document.getElementById('voteChart');
new Chart(ctx, {
  type: 'bar',
  data: {
    labels: ["YND01","YND06","YND09"],
    datasets: [{ label: 'Vote %', data: ["21.35","40.10",12] }]
  }
});
</script>
</body></html>"#;

#[derive(Clone, Debug)]
pub enum Reply {
    Page { path: &'static str, status: u16, body: &'static str },
    Fail(VoteError),
}

pub fn page(path: &'static str, body: &'static str) -> Reply {
    Reply::Page { path, status: 200, body }
}

pub fn status(path: &'static str, status: u16) -> Reply {
    Reply::Page { path, status, body: "" }
}

/// Data page served normally.
pub fn data_ok() -> Reply {
    page(DATA, CHART_PAGE)
}

/// Data request bounced to the login form.
pub fn data_expired() -> Reply {
    page(LOGIN_PAGE, LOGIN_FORM)
}

/// Login post accepted: redirected away from the login surface.
pub fn login_ok() -> Reply {
    page(HOME, "<html>welcome</html>")
}

/// Login post rejected: back on the login form.
pub fn login_rejected() -> Reply {
    page(LOGIN_PAGE, LOGIN_FORM)
}

/// Transport that answers from per-route queues. The last reply of a queue
/// repeats forever.
pub struct ScriptedTransport {
    base: Url,
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    hits: Mutex<Vec<String>>,
    forms: Mutex<Vec<Vec<(String, String)>>>,
    cookies: AtomicBool,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        let t = Self {
            base: Url::parse("https://vendor.test").unwrap(),
            routes: Mutex::new(HashMap::new()),
            hits: Mutex::new(Vec::new()),
            forms: Mutex::new(Vec::new()),
            cookies: AtomicBool::new(false),
        };
        t.script("GET", LOGIN_PAGE, [page(LOGIN_PAGE, LOGIN_FORM)]);
        t.script("POST", LOGIN_ACTION, [login_ok()]);
        t.script("GET", DATA, [data_ok()]);
        Arc::new(t)
    }

    pub fn script<I: IntoIterator<Item = Reply>>(&self, method: &str, path: &str, replies: I) {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{method} {path}"), replies.into_iter().collect());
    }

    pub fn set_cookies(&self, present: bool) {
        self.cookies.store(present, Ordering::SeqCst);
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn clear_hits(&self) {
        self.hits.lock().unwrap().clear();
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let key = format!("{method} {path}");
        self.hits().iter().filter(|h| **h == key).count()
    }

    pub fn forms(&self) -> Vec<Vec<(String, String)>> {
        self.forms.lock().unwrap().clone()
    }

    fn answer(&self, method: &str, url: &Url) -> Result<HttpPage, VoteError> {
        let key = format!("{method} {}", url.path());
        self.hits.lock().unwrap().push(key.clone());
        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes
                .get_mut(&key)
                .unwrap_or_else(|| panic!("unscripted request {key}"));
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        };
        match reply {
            Reply::Page { path, status, body } => Ok(HttpPage {
                final_url: self.base.join(path).unwrap(),
                status,
                body: body.to_string(),
            }),
            Reply::Fail(e) => Err(e),
        }
    }
}

#[async_trait]
impl AcmTransport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<HttpPage, VoteError> {
        self.answer("GET", url)
    }

    async fn post_form(&self, url: &Url, form: &[(String, String)]) -> Result<HttpPage, VoteError> {
        self.forms.lock().unwrap().push(form.to_vec());
        self.answer("POST", url)
    }

    fn has_session_cookies(&self, _url: &Url) -> bool {
        self.cookies.load(Ordering::SeqCst)
    }
}

pub fn session_config(base: &str) -> SessionConfig {
    let base = Url::parse(base).unwrap();
    SessionConfig::new(
        base.join(LOGIN_PAGE).unwrap(),
        base.join(LOGIN_ACTION).unwrap(),
        base.join("/yna2025/votesummary.php?tpid=4").unwrap(),
    )
}

pub fn creds() -> Credentials {
    Credentials::new("voter@example.com", "s3cret").unwrap()
}

pub fn scripted_connector(
    transport: &Arc<ScriptedTransport>,
    credentials: Option<Credentials>,
) -> AcmConnector {
    AcmConnector::builder(session_config("https://vendor.test"))
        .credentials(credentials)
        .transport(Arc::clone(transport) as Arc<dyn AcmTransport>)
        .build()
        .unwrap()
}
