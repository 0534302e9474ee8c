//! hyper service: routing, form handling, and the session lifecycle.
//!
//! One evaluator per browser; the session rides on an opaque `sid`
//! cookie. Handlers never trust client-posted identifiers for the
//! current sample; they re-derive it from the session.

use crate::audio;
use crate::pages;
use crate::state::{Mode, ServerState, Session};
use audition_core::calibration::{CalibrationSummary, MAX_COARSE_SCORE};
use audition_core::log::{timestamp_now, CalibrationRow, CompareRow, SingleRow};
use audition_core::pairing::PresentationOrder;
use audition_core::scoring::{consistency, Preference, Score};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

type Body = Full<Bytes>;

pub async fn serve(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr).await?;
    serve_with(listener, state).await
}

/// Accept loop over an already-bound listener (lets tests bind port 0).
pub async fn serve_with(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    tracing::info!(
        addr = %listener.local_addr()?,
        mode = state.mode.as_str(),
        "listening"
    );

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle_request(req, state.clone())))
                .await
            {
                tracing::warn!(%peer, error = ?e, "connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Body>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::debug!(%method, %path, "request");

    let resp = match (method.clone(), path.as_str()) {
        (Method::GET, "/") => handle_index(&req, &state).await,
        (Method::POST, "/session") => handle_open_session(req, &state).await,
        (Method::POST, "/back") => handle_back(&req, &state).await,

        (Method::GET, "/eval") if state.mode == Mode::Single => handle_eval(&req, &state).await,
        (Method::POST, "/score") if state.mode == Mode::Single => {
            handle_score(req, &state).await
        }

        (Method::GET, "/compare") if state.mode == Mode::Compare => {
            handle_compare(&req, &state).await
        }
        (Method::POST, "/compare/score") if state.mode == Mode::Compare => {
            handle_compare_score(req, &state).await
        }

        (Method::GET, "/calibrate") if state.mode == Mode::Calibrate => {
            handle_calibrate(&req, &state).await
        }
        (Method::POST, "/calibrate/score") if state.mode == Mode::Calibrate => {
            handle_calibrate_score(req, &state).await
        }

        (Method::GET, "/health") => json_response(
            StatusCode::OK,
            json!({"status": "ok", "mode": state.mode.as_str()}),
        ),

        _ if method == Method::GET && path.starts_with("/audio/") => {
            match path["/audio/".len()..].split_once('/') {
                Some((model, file)) => {
                    audio::clip_response(&state.config.audio_dir, model, file)
                }
                None => json_response(StatusCode::NOT_FOUND, json!({"error": "not found"})),
            }
        }

        _ => json_response(StatusCode::NOT_FOUND, json!({"error": "not found"})),
    };
    Ok(resp)
}

// ---------------------------------------------------------------------------
// Name entry
// ---------------------------------------------------------------------------

fn mode_heading(mode: Mode) -> &'static str {
    match mode {
        Mode::Single => "TTS Evaluation App",
        Mode::Compare => "TTS Model Comparison App",
        Mode::Calibrate => "Criteria Understanding Test",
    }
}

async fn handle_index(req: &Request<Incoming>, state: &ServerState) -> Response<Body> {
    if let Some(sid) = cookie_session_id(req) {
        if state.sessions.read().await.contains_key(&sid) {
            return redirect(state.mode.landing_path());
        }
    }
    html_response(StatusCode::OK, pages::name_page(mode_heading(state.mode), None))
}

async fn handle_open_session(req: Request<Incoming>, state: &ServerState) -> Response<Body> {
    let form = parse_form(&collect_body(req).await);
    let user_name = form.get("user_name").map(|s| s.trim()).unwrap_or("");
    if user_name.is_empty() {
        return html_response(
            StatusCode::OK,
            pages::name_page(
                mode_heading(state.mode),
                Some("Please enter your name to start."),
            ),
        );
    }
    let sid = state.open_session(user_name.to_string()).await;
    tracing::info!(user_name, mode = state.mode.as_str(), "session opened");
    redirect_with_cookie(state.mode.landing_path(), &sid)
}

async fn handle_back(req: &Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(sid) = cookie_session_id(req) else {
        return redirect("/");
    };
    let mut sessions = state.sessions.write().await;
    match sessions.get_mut(&sid) {
        Some(Session::Single(s)) => s.retreat(),
        Some(Session::Compare(s)) => s.retreat(),
        // The calibration draw has no order to step back through.
        Some(Session::Calibration(_)) | None => {}
    }
    redirect(state.mode.landing_path())
}

// ---------------------------------------------------------------------------
// Single variant
// ---------------------------------------------------------------------------

async fn handle_eval(req: &Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(manifest) = state.manifest.as_ref() else {
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "no manifest"}));
    };
    let Some(sid) = cookie_session_id(req) else {
        return redirect("/");
    };
    let mut sessions = state.sessions.write().await;
    let Some(Session::Single(session)) = sessions.get_mut(&sid) else {
        return redirect("/");
    };
    match session.position(manifest) {
        Some(position) => html_response(StatusCode::OK, pages::single_page(&position)),
        None => html_response(StatusCode::OK, pages::done_page("All models evaluated!")),
    }
}

async fn handle_score(req: Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(sid) = cookie_session_id(&req) else {
        return redirect("/");
    };
    let form = parse_form(&collect_body(req).await);
    let Some(score) = form.get("score").and_then(|s| Score::parse(s)) else {
        return json_response(StatusCode::BAD_REQUEST, json!({"error": "missing or invalid score"}));
    };
    let Some(manifest) = state.manifest.as_ref() else {
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "no manifest"}));
    };

    let mut sessions = state.sessions.write().await;
    let Some(Session::Single(session)) = sessions.get_mut(&sid) else {
        return redirect("/");
    };
    let Some(position) = session.position(manifest) else {
        return redirect("/eval");
    };

    let row = SingleRow {
        user_name: session.user_name.clone(),
        model: position.model.clone(),
        audio_file: position.audio_file.clone(),
        transcription: position.transcription.clone(),
        score,
        timestamp: timestamp_now(),
    };
    if let Err(e) = state.single_log().append(&row) {
        tracing::error!(error = ?e, "failed to write score log");
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "log write failed"}));
    }
    tracing::info!(
        user_name = %session.user_name,
        model = %position.model,
        audio_file = %position.audio_file,
        score = score.value(),
        "score saved"
    );
    session.record(&position.model, &position.audio_file, score);
    session.advance();
    redirect("/eval")
}

// ---------------------------------------------------------------------------
// Compare variant
// ---------------------------------------------------------------------------

async fn handle_compare(req: &Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(manifest) = state.manifest.as_ref() else {
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "no manifest"}));
    };
    let Some(sid) = cookie_session_id(req) else {
        return redirect("/");
    };
    let mut sessions = state.sessions.write().await;
    let Some(Session::Compare(session)) = sessions.get_mut(&sid) else {
        return redirect("/");
    };
    let position = session.position(
        manifest,
        Some(&state.config.audio_dir),
        &mut rand::thread_rng(),
    );
    match position {
        Some(position) => html_response(StatusCode::OK, pages::compare_page(&position)),
        None => html_response(StatusCode::OK, pages::done_page("All model pairs evaluated!")),
    }
}

async fn handle_compare_score(req: Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(sid) = cookie_session_id(&req) else {
        return redirect("/");
    };
    let form = parse_form(&collect_body(req).await);
    let scores = (
        form.get("score_a").and_then(|s| Score::parse(s)),
        form.get("score_b").and_then(|s| Score::parse(s)),
    );
    let (Some(score_a), Some(score_b)) = scores else {
        return json_response(StatusCode::BAD_REQUEST, json!({"error": "missing or invalid scores"}));
    };
    let preferred_a = match form.get("preference").map(String::as_str) {
        Some("a") => true,
        Some("b") => false,
        _ => {
            return json_response(StatusCode::BAD_REQUEST, json!({"error": "missing preference"}));
        }
    };
    let Some(manifest) = state.manifest.as_ref() else {
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "no manifest"}));
    };

    let mut sessions = state.sessions.write().await;
    let Some(Session::Compare(session)) = sessions.get_mut(&sid) else {
        return redirect("/");
    };
    let Some(position) = session.position(
        manifest,
        Some(&state.config.audio_dir),
        &mut rand::thread_rng(),
    ) else {
        return redirect("/compare");
    };

    // Undo the blind: slider A/B back to baseline/experimental.
    let (baseline_score, experimental_score) = match position.order {
        PresentationOrder::BaselineFirst => (score_a, score_b),
        PresentationOrder::ExperimentalFirst => (score_b, score_a),
    };
    let preference = match (position.order, preferred_a) {
        (PresentationOrder::BaselineFirst, true) => Preference::Baseline,
        (PresentationOrder::BaselineFirst, false) => Preference::Experimental,
        (PresentationOrder::ExperimentalFirst, true) => Preference::Experimental,
        (PresentationOrder::ExperimentalFirst, false) => Preference::Baseline,
    };
    let consistent = consistency(preference, baseline_score, experimental_score);

    let row = CompareRow {
        user_name: session.user_name.clone(),
        baseline_model: position.baseline_model.clone(),
        experimental_model: position.experimental_model.clone(),
        baseline_audio: position.baseline_file.clone(),
        experimental_audio: position.experimental_file.clone(),
        baseline_score,
        experimental_score,
        preference,
        consistent,
        presented_first: position.order,
        timestamp: timestamp_now(),
    };
    if let Err(e) = state.compare_log().append(&row) {
        tracing::error!(error = ?e, "failed to write comparison log");
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "log write failed"}));
    }
    tracing::info!(
        user_name = %session.user_name,
        baseline = %position.baseline_model,
        experimental = %position.experimental_model,
        preference = preference.as_str(),
        consistent,
        "comparison saved"
    );
    session.advance();
    redirect("/compare")
}

// ---------------------------------------------------------------------------
// Calibration variant
// ---------------------------------------------------------------------------

async fn handle_calibrate(req: &Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(sid) = cookie_session_id(req) else {
        return redirect("/");
    };
    let sessions = state.sessions.read().await;
    let Some(Session::Calibration(session)) = sessions.get(&sid) else {
        return redirect("/");
    };
    match session.current() {
        Some(clip) => html_response(
            StatusCode::OK,
            pages::calibrate_page(
                &session.user_name,
                clip,
                session.done_count(),
                session.total(),
            ),
        ),
        None => {
            let rows = match state.calibration_log().read_all() {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!(error = ?e, "failed to read calibration log");
                    return json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({"error": "log read failed"}),
                    );
                }
            };
            match CalibrationSummary::from_rows(&session.user_name, &rows) {
                Some(summary) => {
                    html_response(StatusCode::OK, pages::calibrate_results_page(&summary))
                }
                None => html_response(StatusCode::OK, pages::done_page("No ratings recorded.")),
            }
        }
    }
}

async fn handle_calibrate_score(req: Request<Incoming>, state: &ServerState) -> Response<Body> {
    let Some(sid) = cookie_session_id(&req) else {
        return redirect("/");
    };
    let form = parse_form(&collect_body(req).await);
    let Some(score) = form
        .get("score")
        .and_then(|s| s.trim().parse::<u8>().ok())
        .map(|s| s.min(MAX_COARSE_SCORE))
    else {
        return json_response(StatusCode::BAD_REQUEST, json!({"error": "missing or invalid score"}));
    };

    let mut sessions = state.sessions.write().await;
    let Some(Session::Calibration(session)) = sessions.get_mut(&sid) else {
        return redirect("/");
    };
    let Some(clip) = session.current() else {
        return redirect("/calibrate");
    };

    let row = CalibrationRow {
        user_name: session.user_name.clone(),
        audio_name: clip.file.to_string(),
        reference_score: clip.expected,
        user_score: score,
        timestamp: timestamp_now(),
    };
    if let Err(e) = state.calibration_log().append(&row) {
        tracing::error!(error = ?e, "failed to write calibration log");
        return json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "log write failed"}));
    }
    let file = clip.file;
    session.complete(file, &mut rand::thread_rng());
    redirect("/calibrate")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn collect_body(req: Request<Incoming>) -> String {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map(|b| b.to_bytes())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).to_string()
}

pub(crate) fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub(crate) fn cookie_session_id(req: &Request<Incoming>) -> Option<String> {
    let header = req.headers().get("cookie")?.to_str().ok()?;
    parse_cookie_header(header)
}

pub(crate) fn parse_cookie_header(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == "sid").then(|| value.to_string())
    })
}

fn html_response(status: StatusCode, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn redirect(location: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header("Location", location)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn redirect_with_cookie(location: &str, sid: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header("Location", location)
        .header("Set-Cookie", format!("sid={}; Path=/; HttpOnly", sid))
        .body(Full::new(Bytes::new()))
        .unwrap()
}
