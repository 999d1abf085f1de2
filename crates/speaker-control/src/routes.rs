//! Request routing, independent of the HTTP transport.

use crate::error::{ControlError, Result};
use crate::query::{clamp_to_range, collect_updates, param, parse_value, split_url};
use serde::{Deserialize, Serialize};
use speaker_engine::{NowPlaying, ParamId, ParamSnapshot, ParameterStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Options,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "text/plain", body: body.into() }
    }

    fn ok() -> Self {
        Self::text(200, "ok\n")
    }

    fn json(body: String) -> Self {
        Self { status: 200, content_type: "application/json", body }
    }

    fn error(err: &ControlError) -> Self {
        Self::text(err.status(), format!("{err}\n"))
    }
}

/// Shared handles the control plane mutates.
#[derive(Clone)]
pub struct ControlState {
    pub params: Arc<ParameterStore>,
    pub now_playing: Arc<NowPlaying>,
}

#[derive(Serialize)]
struct StateView {
    #[serde(flatten)]
    params: ParamSnapshot,
    now_playing: String,
}

#[derive(Deserialize)]
struct NowPlayingBody {
    name: String,
}

impl ControlState {
    pub fn new(params: Arc<ParameterStore>, now_playing: Arc<NowPlaying>) -> Self {
        Self { params, now_playing }
    }

    pub fn handle(&self, method: Method, url: &str, body: &str) -> Reply {
        let (path, query) = split_url(url);
        let result = match (method, path) {
            (Method::Options, _) => return Reply::text(204, ""),
            (Method::Get, "/health") => Ok(Reply::ok()),
            (Method::Get, "/state") => self.state(),
            (Method::Post, "/gain") => self.set_gain(&query),
            (Method::Patch, "/state") => self.patch_state(&query),
            (Method::Post, "/now_playing") => self.set_now_playing(&query, body),
            _ => Err(ControlError::NotFound),
        };
        result.unwrap_or_else(|e| {
            log::debug!("control: rejected {method:?} {path}: {e:?}");
            Reply::error(&e)
        })
    }

    fn state(&self) -> Result<Reply> {
        let view = StateView {
            params: self.params.snapshot(),
            now_playing: self.now_playing.get(),
        };
        // Plain floats and a string; serialisation cannot fail.
        let body = serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string());
        Ok(Reply::json(body))
    }

    fn set_gain(&self, query: &[(String, String)]) -> Result<Reply> {
        let raw = param(query, "db").ok_or(ControlError::MissingParam("db"))?;
        let db = parse_value(raw).ok_or(ControlError::InvalidValue("db"))?;
        let db = clamp_to_range(ParamId::GainDb, db);
        self.params.set(ParamId::GainDb, db);
        log::info!("control: gain_db = {db}");
        Ok(Reply::ok())
    }

    fn patch_state(&self, query: &[(String, String)]) -> Result<Reply> {
        let updates = collect_updates(query)?;
        for (id, v) in updates {
            self.params.set(id, v);
            log::info!("control: {} = {v}", id.name());
        }
        Ok(Reply::ok())
    }

    fn set_now_playing(&self, query: &[(String, String)], body: &str) -> Result<Reply> {
        let name = match param(query, "name") {
            Some(name) => name.to_string(),
            None if !body.trim().is_empty() => serde_json::from_str::<NowPlayingBody>(body)
                .map(|b| b.name)
                .map_err(|_| ControlError::MissingName)?,
            None => return Err(ControlError::MissingName),
        };
        log::info!("control: now playing '{name}'");
        self.now_playing.set(name);
        Ok(Reply::ok())
    }
}
