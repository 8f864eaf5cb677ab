//! JSON-lines serving loop.
//!
//! Each input line holds one request, e.g.
//! `{"op":"get","id":1}`; each output line holds the matching response.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;
use useradmin_core::{AccountStore, AccountWriter, PasswordHasher, Request, Response, Status};

/// Serves requests until the input is exhausted.
///
/// Lines that are not UTF-8 or not a known request are answered with a
/// `400` and serving continues.
///
/// Returns the number of requests answered.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub async fn serve<R, W, S, H>(
    writer: &AccountWriter<S, H>,
    mut input: R,
    mut output: W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: AccountStore,
    H: PasswordHasher,
{
    let mut buf = Vec::new();
    let mut served = 0;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let response = match decode(line) {
            Ok(request) => {
                debug!("Dispatching {} request", request.operation());
                useradmin_core::dispatch(writer, request).await
            }
            Err(reason) => {
                debug!("Rejected malformed request: {reason}");
                Response::message(Status::BadRequest, &format!("Malformed request: {reason}"))
            }
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
        served += 1;
    }

    Ok(served)
}

/// Decodes one request line.
fn decode(line: &[u8]) -> Result<Request, String> {
    let text = std::str::from_utf8(line).map_err(|e| e.to_string())?;
    serde_json::from_str(text).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::io::BufReader;
    use useradmin_core::{AccountRepository, BcryptHasher, seed_default_accounts};

    async fn writer() -> AccountWriter<AccountRepository, BcryptHasher> {
        let repo = AccountRepository::in_memory().await.unwrap();
        let writer = AccountWriter::new(repo, BcryptHasher::new(4));
        seed_default_accounts(&writer).await.unwrap();
        writer
    }

    async fn run_with(
        writer: &AccountWriter<AccountRepository, BcryptHasher>,
        input: &str,
    ) -> Vec<Value> {
        let mut output = Vec::new();
        serve(writer, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    async fn run(input: &str) -> Vec<Value> {
        run_with(&writer().await, input).await
    }

    #[tokio::test]
    async fn test_one_response_per_request() {
        let responses = run(concat!(
            r#"{"op":"list"}"#,
            "\n\n",
            r#"{"op":"current","username":"admin"}"#,
            "\n",
            r#"{"op":"get","id":99}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["status"], 200);
        assert_eq!(responses[0]["body"].as_array().unwrap().len(), 2);
        assert_eq!(responses[1]["body"]["username"], "admin");
        assert_eq!(responses[2]["status"], 404);
    }

    #[tokio::test]
    async fn test_malformed_line_is_bad_request() {
        let responses = run("{\"op\":\"launch\"}\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["status"], 400);
        assert!(
            responses[0]["body"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Malformed request")
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_serving() {
        let writer = writer().await;
        let mut input = b"{\"op\":\"get\",\"id\":\"\xff\"}\n".to_vec();
        input.extend_from_slice(b"{\"op\":\"list\"}\n");

        let mut output = Vec::new();
        let served = serve(&writer, BufReader::new(input.as_slice()), &mut output)
            .await
            .unwrap();
        assert_eq!(served, 2);

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses[0]["status"], 400);
        assert!(
            responses[0]["body"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Malformed request")
        );
        assert_eq!(responses[1]["status"], 200);
        assert_eq!(responses[1]["body"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_served() {
        let responses = run(r#"{"op":"current","username":"user"}"#).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["body"]["username"], "user");
    }

    #[tokio::test]
    async fn test_edit_echoing_hash_keeps_it() {
        let writer = writer().await;

        let before = run_with(&writer, "{\"op\":\"current\",\"username\":\"user\"}\n").await;
        let mut account = before[0]["body"].clone();
        let hash = account["password"].as_str().unwrap().to_string();
        assert_ne!(hash, "12345");

        // Echo the account back with a new email, roles as ids
        let id = account["id"].clone();
        account["email"] = Value::from("renamed@mail.com");
        account["roles"] = serde_json::json!([1]);
        let edit = serde_json::json!({ "op": "edit", "id": id, "account": account });
        let responses = run_with(&writer, &format!("{edit}\n")).await;
        assert_eq!(responses[0]["status"], 200);

        let after = run_with(&writer, "{\"op\":\"current\",\"username\":\"user\"}\n").await;
        assert_eq!(after[0]["body"]["password"], hash.as_str());
        assert_eq!(after[0]["body"]["email"], "renamed@mail.com");
    }
}
