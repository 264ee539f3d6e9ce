//! Request dispatch for the JSON API.
//!
//! # Responsibility
//! - Resolve the route, gate it on a session, run the use case, render JSON.
//!
//! # Invariants
//! - Users are rendered without their password hash.
//! - Signing in or registering replaces the caller's previous session.
//! - Handlers are synchronous; callers run them off the async executor.

use crate::cookie::SessionCookie;
use crate::error::{ApiError, ApiResult};
use crate::routes::{Resource, Route};
use http::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};
use http::{Method, Request, Response, StatusCode};
use profile_core::{
    core_version, BackendKind, Education, Language, LoginRequest, OwnedRecord, ProfilePatch,
    ProfileService, RecordService, RegisterRequest, ServiceError, SessionStore, SocialMedia,
    Storage, Topic, User, WorkExperience,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// The whole API as one synchronous handler.
#[derive(Debug)]
pub struct App {
    profiles: ProfileService,
    records: RecordService,
    sessions: Arc<SessionStore>,
    cookie: SessionCookie,
    backend: BackendKind,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    backend: &'static str,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

impl App {
    pub fn new(storage: Storage, sessions: Arc<SessionStore>, cookie: SessionCookie) -> Self {
        Self {
            backend: storage.backend_kind(),
            profiles: ProfileService::new(storage.clone()),
            records: RecordService::new(storage),
            sessions,
            cookie,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handles one request; failures become JSON error responses.
    pub fn handle(&self, request: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        self.dispatch(request)
            .unwrap_or_else(ApiError::into_response)
    }

    fn dispatch(&self, request: &Request<Vec<u8>>) -> ApiResult<Response<Vec<u8>>> {
        let route = Route::match_path(request.uri().path())
            .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;
        if !route.allows(request.method()) {
            return Err(ApiError::MethodNotAllowed {
                allow: route.allow_header(),
            });
        }
        let actor = if route.requires_session() {
            Some(self.authenticate(request)?)
        } else {
            None
        };
        let actor = actor.as_deref().unwrap_or_default();
        let method = request.method();

        match route {
            Route::Health => json(
                StatusCode::OK,
                &Health {
                    status: "ok",
                    version: core_version(),
                    backend: self.backend.label(),
                },
            ),
            Route::Register => self.register(request),
            Route::Login => self.login(request),
            Route::Logout => self.logout(request),
            Route::User | Route::Profile if *method == Method::GET => {
                let user = self.profiles.current_user(actor)?;
                json(StatusCode::OK, &user.redacted())
            }
            Route::User | Route::Profile => {
                let patch: ProfilePatch = parse_body(request)?;
                let user = self.profiles.update_profile(actor, &patch)?;
                json(StatusCode::OK, &user.redacted())
            }
            Route::Collection(resource) => self.resource(resource, method, request, actor, None),
            Route::Item(resource, id) => {
                self.resource(resource, method, request, actor, Some(id.as_str()))
            }
        }
    }

    /// Resolves the session cookie to an existing user id.
    fn authenticate(&self, request: &Request<Vec<u8>>) -> ApiResult<String> {
        let user_id = self
            .cookie
            .read(request.headers())
            .and_then(|session_id| self.sessions.resolve(&session_id))
            .ok_or(ApiError::Unauthenticated)?;
        match self.profiles.current_user(&user_id) {
            Ok(user) => Ok(user.id),
            Err(ServiceError::NotFound(_)) => Err(ApiError::Unauthenticated),
            Err(err) => Err(err.into()),
        }
    }

    fn register(&self, request: &Request<Vec<u8>>) -> ApiResult<Response<Vec<u8>>> {
        let payload: RegisterRequest = parse_body(request)?;
        let user = self.profiles.register(&payload)?;
        self.start_session(request, StatusCode::CREATED, &user)
    }

    fn login(&self, request: &Request<Vec<u8>>) -> ApiResult<Response<Vec<u8>>> {
        let payload: LoginRequest = parse_body(request)?;
        let user = self.profiles.login(&payload)?;
        self.start_session(request, StatusCode::OK, &user)
    }

    fn logout(&self, request: &Request<Vec<u8>>) -> ApiResult<Response<Vec<u8>>> {
        if let Some(session_id) = self.cookie.read(request.headers()) {
            self.sessions.destroy(&session_id);
        }
        let mut response = json(
            StatusCode::OK,
            &Message {
                message: "Logged out",
            },
        )?;
        set_cookie(&mut response, &self.cookie.expire())?;
        Ok(response)
    }

    fn start_session(
        &self,
        request: &Request<Vec<u8>>,
        status: StatusCode,
        user: &User,
    ) -> ApiResult<Response<Vec<u8>>> {
        if let Some(previous) = self.cookie.read(request.headers()) {
            self.sessions.destroy(&previous);
        }
        let session_id = self.sessions.create(&user.id);
        let mut response = json(status, &user.redacted())?;
        set_cookie(&mut response, &self.cookie.issue(&session_id))?;
        Ok(response)
    }

    fn resource(
        &self,
        resource: Resource,
        method: &Method,
        request: &Request<Vec<u8>>,
        actor: &str,
        id: Option<&str>,
    ) -> ApiResult<Response<Vec<u8>>> {
        match resource {
            Resource::Educations => self.crud::<Education>(method, request, actor, id),
            Resource::WorkExperiences => self.crud::<WorkExperience>(method, request, actor, id),
            Resource::Languages => self.crud::<Language>(method, request, actor, id),
            Resource::Topics => self.crud::<Topic>(method, request, actor, id),
            Resource::SocialMedias => self.crud::<SocialMedia>(method, request, actor, id),
        }
    }

    fn crud<R: OwnedRecord>(
        &self,
        method: &Method,
        request: &Request<Vec<u8>>,
        actor: &str,
        id: Option<&str>,
    ) -> ApiResult<Response<Vec<u8>>> {
        match (id, method.as_str()) {
            (None, "GET") => json(StatusCode::OK, &self.records.list::<R>(actor)?),
            (None, _) => {
                let new: R::New = parse_body(request)?;
                json(StatusCode::CREATED, &self.records.create::<R>(actor, &new)?)
            }
            (Some(id), "GET") => json(StatusCode::OK, &self.records.get::<R>(actor, id)?),
            (Some(id), "PATCH") => {
                let patch: R::Patch = parse_body(request)?;
                json(StatusCode::OK, &self.records.update::<R>(actor, id, patch)?)
            }
            (Some(id), _) => {
                self.records.delete::<R>(actor, id)?;
                Ok(empty(StatusCode::NO_CONTENT))
            }
        }
    }
}

/// Parses a JSON object body; an empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(request: &Request<Vec<u8>>) -> ApiResult<T> {
    let body = request.body();
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice::<Value>(body)
            .map_err(|err| ApiError::MalformedBody(err.to_string()))?
    };
    if !value.is_object() {
        return Err(ApiError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|err| ApiError::MalformedBody(err.to_string()))
}

fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> ApiResult<Response<Vec<u8>>> {
    let mut response = empty(status);
    *response.body_mut() = serde_json::to_vec(body)?;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

fn empty(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}

fn set_cookie(response: &mut Response<Vec<u8>>, cookie: &str) -> ApiResult<()> {
    let value = HeaderValue::from_str(cookie).map_err(|err| ApiError::Internal(Box::new(err)))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
