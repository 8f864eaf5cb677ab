//! Request dispatch for the serving layer.
//!
//! Decoded requests are routed to the [`AccountWriter`] and every outcome,
//! including errors, is turned into a [`Response`]. Client mistakes become
//! `400`/`404` responses carrying a message; server faults are logged with
//! the operation and target and answered with a generic message.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::writer::AccountWriter;
use crate::Error;
use crate::account::{AccountId, AccountPayload, AccountStore, PasswordHasher, ValidationError};

/// Message returned in place of server-fault details.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Response status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u16")]
pub enum Status {
    /// Request succeeded.
    Ok,
    /// Payload failed validation or collided with an existing account.
    BadRequest,
    /// The requested account does not exist.
    NotFound,
    /// The store or hasher failed.
    InternalServerError,
}

impl Status {
    /// The HTTP-equivalent status code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// List every account.
    List,
    /// Fetch one account by id.
    Get {
        /// Account id.
        id: AccountId,
    },
    /// Fetch the account of the authenticated principal.
    Current {
        /// Principal name.
        username: String,
    },
    /// Create an account.
    Create {
        /// Account payload.
        account: AccountPayload,
    },
    /// Replace an account.
    Edit {
        /// Account id.
        id: AccountId,
        /// Full replacement payload.
        account: AccountPayload,
    },
    /// Delete an account.
    Delete {
        /// Account id.
        id: AccountId,
    },
}

impl Request {
    /// Operation name used in logs.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get { .. } => "get",
            Self::Current { .. } => "current",
            Self::Create { .. } => "create",
            Self::Edit { .. } => "edit",
            Self::Delete { .. } => "delete",
        }
    }

    /// The account this request targets, if it names one.
    #[must_use]
    pub fn target(&self) -> Option<String> {
        match self {
            Self::List => None,
            Self::Get { id } | Self::Edit { id, .. } | Self::Delete { id } => {
                Some(id.to_string())
            }
            Self::Current { username } => Some(username.clone()),
            Self::Create { account } => Some(account.username.clone()),
        }
    }
}

/// Outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Status classification.
    pub status: Status,
    /// Response body, absent for bodiless successes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Response {
    /// A bodiless success.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: Status::Ok,
            body: None,
        }
    }

    /// A success carrying a serializable body.
    #[must_use]
    pub fn ok_with<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status: Status::Ok,
                body: Some(value),
            },
            Err(e) => {
                error!("Failed to encode response body: {e}");
                Self::message(Status::InternalServerError, INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    /// A response carrying `{ "message": ... }`.
    #[must_use]
    pub fn message(status: Status, message: &str) -> Self {
        Self {
            status,
            body: Some(serde_json::json!({ "message": message })),
        }
    }

    /// Reads the message of a message-only response.
    #[must_use]
    pub fn message_text(&self) -> Option<&str> {
        self.body.as_ref()?.get("message")?.as_str()
    }
}

/// Runs a request against the writer and encodes the outcome.
pub async fn dispatch<S, H>(writer: &AccountWriter<S, H>, request: Request) -> Response
where
    S: AccountStore,
    H: PasswordHasher,
{
    let operation = request.operation();
    let target = request.target();

    let outcome = match request {
        Request::List => writer.list().await.map(|accounts| Response::ok_with(&accounts)),
        Request::Get { id } => writer
            .get_by_id(id)
            .await
            .map(|account| Response::ok_with(&account)),
        Request::Current { username } => writer
            .find_by_username(&username)
            .await
            .map(|account| Response::ok_with(&account)),
        Request::Create { account } => writer.create(account).await.map(|_| Response::ok()),
        Request::Edit { id, account } => writer.edit(id, account).await.map(|_| Response::ok()),
        Request::Delete { id } => writer
            .delete(id)
            .await
            .map(|()| Response::message(Status::Ok, "User deleted")),
    };

    outcome.unwrap_or_else(|err| error_response(operation, target.as_deref(), &err))
}

/// Maps an error to its response, logging server faults.
fn error_response(operation: &str, target: Option<&str>, err: &Error) -> Response {
    let status = err.status();
    if err.is_server_fault() {
        error!(
            operation,
            target = target.unwrap_or("-"),
            "Request failed: {err}"
        );
        return Response::message(status, INTERNAL_ERROR_MESSAGE);
    }

    if let Error::Validation(errors) = err {
        let fields: Vec<&str> = errors.iter().map(ValidationError::field).collect();
        debug!(operation, ?fields, "Payload failed validation");
    }
    debug!(operation, status = status.code(), "Request rejected: {err}");
    Response::message(status, &err.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::account::{AccountRepository, BcryptHasher};

    async fn writer() -> AccountWriter<AccountRepository, BcryptHasher> {
        let repo = AccountRepository::in_memory().await.unwrap();
        AccountWriter::new(repo, BcryptHasher::new(4))
    }

    fn request(json: &str) -> Request {
        serde_json::from_str(json).unwrap()
    }

    const CREATE_BOB: &str = r#"{
        "op": "create",
        "account": {
            "firstName": "Bob", "lastName": "Builder", "age": 40,
            "email": "bob@example.com", "username": "bob",
            "password": "pw1", "roles": [2]
        }
    }"#;

    #[test]
    fn test_request_decoding() {
        assert_eq!(request(r#"{"op":"list"}"#), Request::List);
        assert_eq!(
            request(r#"{"op":"delete","id":3}"#),
            Request::Delete {
                id: AccountId::new(3)
            }
        );
        let create = request(CREATE_BOB);
        assert_eq!(create.operation(), "create");
        assert_eq!(create.target().as_deref(), Some("bob"));
    }

    #[test]
    fn test_response_encoding() {
        let json = serde_json::to_value(Response::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": 200 }));

        let json = serde_json::to_value(Response::message(Status::NotFound, "gone")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": 404, "body": { "message": "gone" } })
        );
    }

    #[tokio::test]
    async fn test_create_then_current() {
        let writer = writer().await;

        let response = dispatch(&writer, request(CREATE_BOB)).await;
        assert_eq!(response, Response::ok());

        let response = dispatch(&writer, request(r#"{"op":"current","username":"bob"}"#)).await;
        assert_eq!(response.status, Status::Ok);
        let body = response.body.unwrap();
        assert_eq!(body["username"], "bob");
        assert_ne!(body["password"], "pw1");
        assert_eq!(body["roles"][0]["name"], "ROLE_ADMIN");
    }

    #[tokio::test]
    async fn test_validation_digest_response() {
        let writer = writer().await;

        let response = dispatch(
            &writer,
            request(
                r#"{"op":"create","account":{
                    "firstName":"A","lastName":"B","age":20,"password":"x","roles":[1]
                }}"#,
            ),
        )
        .await;

        assert_eq!(response.status, Status::BadRequest);
        assert_eq!(
            response.message_text(),
            Some("Username is required; Email is required")
        );
    }

    #[tokio::test]
    async fn test_duplicate_username_response() {
        let writer = writer().await;

        dispatch(&writer, request(CREATE_BOB)).await;
        let response = dispatch(&writer, request(CREATE_BOB)).await;

        assert_eq!(response.status, Status::BadRequest);
        assert_eq!(
            response.message_text(),
            Some("User with username 'bob' already exists")
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let writer = writer().await;

        let response = dispatch(&writer, request(r#"{"op":"get","id":41}"#)).await;
        assert_eq!(response.status, Status::NotFound);
        assert_eq!(response.message_text(), Some("Account not found: id 41"));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let writer = writer().await;

        dispatch(&writer, request(CREATE_BOB)).await;
        let id = writer.find_by_username("bob").await.unwrap().id.unwrap();
        let delete = Request::Delete { id };

        let first = dispatch(&writer, delete.clone()).await;
        assert_eq!(first.message_text(), Some("User deleted"));
        let second = dispatch(&writer, delete).await;
        assert_eq!(second.status, Status::Ok);

        let list = dispatch(&writer, Request::List).await;
        assert_eq!(list.body, Some(serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_server_fault_hides_details() {
        let repo = AccountRepository::in_memory().await.unwrap();
        repo.close().await;
        let writer = AccountWriter::new(repo, BcryptHasher::new(4));

        let response = dispatch(&writer, Request::List).await;
        assert_eq!(response.status, Status::InternalServerError);
        assert_eq!(response.message_text(), Some(INTERNAL_ERROR_MESSAGE));
    }
}
