//! # Algorand REST Client
//!
//! Talks to an algod node (submission, params, balances, confirmation) and
//! an indexer (lookup of committed transactions by id).
//!
//! ## Endpoints
//!
//! | Service | Method | Path | Use |
//! |---------|--------|------|-----|
//! | algod   | GET  | `/v2/transactions/params` | suggested params |
//! | algod   | POST | `/v2/transactions` | submit signed msgpack |
//! | algod   | GET  | `/v2/transactions/pending/{txid}` | confirmation poll |
//! | algod   | GET  | `/v2/status` | current round |
//! | algod   | GET  | `/v2/status/wait-for-block-after/{round}` | block wait |
//! | algod   | GET  | `/v2/blocks/{round}` | round time of a commit |
//! | algod   | GET  | `/v2/accounts/{address}` | balance |
//! | indexer | GET  | `/v2/transactions/{txid}` | lookup |
//! | faucet  | POST | `{faucet_url}` | TestNet funds |
//!
//! ## Error Mapping
//!
//! Transport failures and 5xx become [`LedgerError::Unavailable`] after the
//! retry budget. 401/403, or any 4xx whose message mentions a signature,
//! become [`LedgerError::Unauthorized`]. Every other 4xx is
//! [`LedgerError::Rejected`]. Unparseable bodies are
//! [`LedgerError::Protocol`].

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use trustrx_core::encoding::base64_decode;
use trustrx_core::{AnchorReference, LedgerAddress, Timestamp};

use crate::config::{ConfigError, LedgerConfig};
use crate::error::LedgerError;
use crate::ledger::{
    CommittedEntry, Faucet, FundingReceipt, Ledger, NetworkDescriptor, Submission,
    MICROALGOS_PER_ALGO,
};
use crate::retry::retry_send;
use crate::transaction::{SignedTransaction, SuggestedParams};

const ALGOD_TOKEN_HEADER: &str = "X-Algo-API-Token";
const INDEXER_TOKEN_HEADER: &str = "X-Indexer-API-Token";
const MSGPACK_CONTENT_TYPE: &str = "application/x-binary";

/// What the TestNet dispenser grants per request.
pub const FAUCET_GRANT: u64 = 10 * MICROALGOS_PER_ALGO;

#[derive(Debug, Clone, Copy)]
enum Service {
    Algod,
    Indexer,
}

// -- Response types -----------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ParamsResponse {
    fee: u64,
    min_fee: u64,
    last_round: u64,
    genesis_id: String,
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PendingResponse {
    #[serde(default)]
    confirmed_round: Option<u64>,
    #[serde(default)]
    pool_error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StatusResponse {
    last_round: u64,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    block: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    #[serde(default)]
    ts: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IndexerTransactionResponse {
    transaction: IndexerTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct IndexerTransaction {
    id: String,
    sender: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    round_time: Option<i64>,
    #[serde(default)]
    confirmed_round: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FaucetResponse {
    #[serde(default, rename = "txId")]
    tx_id: Option<String>,
}

// -- Client -------------------------------------------------------------------

/// HTTP client for Algorand algod, indexer, and the TestNet faucet.
#[derive(Debug, Clone)]
pub struct AlgorandClient {
    http: reqwest::Client,
    config: LedgerConfig,
}

impl AlgorandClient {
    /// Build a client from configuration. Endpoints are validated here.
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn url(&self, service: Service, path: &str) -> String {
        let base = match service {
            Service::Algod => &self.config.algod_url,
            Service::Indexer => &self.config.indexer_url,
        };
        format!("{}{}", base.as_str().trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        service: Service,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, LedgerError> {
        let url = self.url(service, path);
        let (header, token) = match service {
            Service::Algod => (ALGOD_TOKEN_HEADER, &self.config.algod_token),
            Service::Indexer => (INDEXER_TOKEN_HEADER, &self.config.indexer_token),
        };
        tracing::debug!(endpoint = path, %method, "ledger request");
        retry_send(path, || {
            let mut req = self.http.request(method.clone(), &url);
            if !token.is_empty() {
                req = req.header(header, token.as_str());
            }
            if let Some(bytes) = &body {
                req = req
                    .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
                    .body(bytes.clone());
            }
            req.send()
        })
        .await
        .map_err(|e| LedgerError::unavailable(path, e))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
    ) -> Result<T, LedgerError> {
        let resp = self.send(service, Method::GET, path, None).await?;
        read_json(path, resp).await
    }

    async fn wait_for_confirmation(&self, reference: &AnchorReference) -> Result<u64, LedgerError> {
        let rounds = self.config.confirmation_rounds.max(1);
        let status: StatusResponse = self.get_json(Service::Algod, "/v2/status").await?;
        let mut round = status.last_round;
        let pending_path = format!("/v2/transactions/pending/{reference}");

        for _ in 0..rounds {
            let pending: PendingResponse = self.get_json(Service::Algod, &pending_path).await?;
            if let Some(confirmed) = pending.confirmed_round.filter(|r| *r > 0) {
                return Ok(confirmed);
            }
            if !pending.pool_error.is_empty() {
                return Err(LedgerError::Rejected(pending.pool_error));
            }
            let wait_path = format!("/v2/status/wait-for-block-after/{round}");
            let _: serde_json::Value = self.get_json(Service::Algod, &wait_path).await?;
            round += 1;
        }

        tracing::warn!(%reference, rounds, "transaction not confirmed within round budget");
        Err(LedgerError::ConfirmationTimeout {
            reference: reference.clone(),
            rounds,
        })
    }

    async fn block_time(&self, round: u64) -> Result<Timestamp, LedgerError> {
        let path = format!("/v2/blocks/{round}");
        let block: BlockResponse = self.get_json(Service::Algod, &path).await?;
        let secs = block
            .block
            .ts
            .ok_or_else(|| LedgerError::protocol(&path, "block has no timestamp"))?;
        Timestamp::from_epoch_secs(secs).map_err(|e| LedgerError::protocol(&path, e))
    }
}

impl Ledger for AlgorandClient {
    fn network(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            name: self.config.network_name.clone(),
            simulated: false,
        }
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, LedgerError> {
        let path = "/v2/transactions/params";
        let params: ParamsResponse = self.get_json(Service::Algod, path).await?;
        let hash = base64_decode(&params.genesis_hash)
            .map_err(|e| LedgerError::protocol(path, format!("genesis-hash: {e}")))?;
        let genesis_hash: [u8; 32] = hash.try_into().map_err(|v: Vec<u8>| {
            LedgerError::protocol(path, format!("genesis-hash is {} bytes", v.len()))
        })?;
        Ok(SuggestedParams {
            fee: params.fee,
            min_fee: params.min_fee,
            last_round: params.last_round,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<Submission, LedgerError> {
        let path = "/v2/transactions";
        let reference = txn.id();
        let resp = self
            .send(Service::Algod, Method::POST, path, Some(txn.encode()))
            .await?;

        let status = resp.status();
        if status.is_success() {
            let accepted: SubmitResponse = read_json(path, resp).await?;
            if accepted.tx_id != reference.as_str() {
                return Err(LedgerError::protocol(
                    path,
                    format!("node reported id {} for {reference}", accepted.tx_id),
                ));
            }
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body);
            // A retried POST can find its own earlier attempt already in the pool.
            if status.is_client_error() && message.contains("already in ledger") {
                tracing::debug!(%reference, "transaction already known to the node");
            } else {
                return Err(map_status(path, status, &body));
            }
        }

        tracing::debug!(%reference, "transaction submitted, awaiting confirmation");
        let confirmed_round = self.wait_for_confirmation(&reference).await?;
        let committed_at = match self.block_time(confirmed_round).await {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!(round = confirmed_round, "block time unavailable: {e}");
                None
            }
        };
        tracing::info!(%reference, round = confirmed_round, "transaction committed");
        Ok(Submission {
            reference,
            confirmed_round,
            committed_at,
        })
    }

    async fn lookup(
        &self,
        reference: &AnchorReference,
    ) -> Result<Option<CommittedEntry>, LedgerError> {
        let path = format!("/v2/transactions/{reference}");
        let resp = self.send(Service::Indexer, Method::GET, &path, None).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let found: IndexerTransactionResponse = read_json(&path, resp).await?;
        let txn = found.transaction;

        if txn.id != reference.as_str() {
            return Err(LedgerError::protocol(
                &path,
                format!("indexer returned transaction {}", txn.id),
            ));
        }
        let (Some(round), Some(round_time)) = (txn.confirmed_round, txn.round_time) else {
            // Indexers only serve committed transactions; treat anything else as absent.
            return Ok(None);
        };
        let note = match txn.note.as_deref() {
            Some(encoded) => base64_decode(encoded)
                .map_err(|e| LedgerError::protocol(&path, format!("note: {e}")))?,
            None => Vec::new(),
        };
        Ok(Some(CommittedEntry {
            reference: reference.clone(),
            sender: LedgerAddress::parse(&txn.sender)
                .map_err(|e| LedgerError::protocol(&path, e))?,
            note,
            round,
            committed_at: Timestamp::from_epoch_secs(round_time)
                .map_err(|e| LedgerError::protocol(&path, e))?,
        }))
    }

    async fn account_balance(&self, address: &LedgerAddress) -> Result<u64, LedgerError> {
        let path = format!("/v2/accounts/{address}");
        let account: AccountResponse = self.get_json(Service::Algod, &path).await?;
        Ok(account.amount)
    }
}

impl Faucet for AlgorandClient {
    async fn request_funds(&self, address: &LedgerAddress) -> Result<FundingReceipt, LedgerError> {
        let url = self.config.faucet_url.as_str();
        let body = serde_json::json!({ "address": address.as_str() });
        let resp = retry_send(url, || self.http.post(url).json(&body).send())
            .await
            .map_err(|e| LedgerError::unavailable(url, e))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_status(url, status, &text));
        }
        let reference = serde_json::from_str::<FaucetResponse>(&text)
            .ok()
            .and_then(|r| r.tx_id);
        tracing::info!(%address, amount = FAUCET_GRANT, "faucet granted funds");
        Ok(FundingReceipt {
            address: address.clone(),
            amount: FAUCET_GRANT,
            reference,
        })
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, LedgerError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(map_status(endpoint, status, &body));
    }
    resp.json::<T>()
        .await
        .map_err(|e| LedgerError::protocol(endpoint, e))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn map_status(endpoint: &str, status: StatusCode, body: &str) -> LedgerError {
    let message = error_message(body);
    if status.is_server_error() {
        LedgerError::unavailable(endpoint, format!("HTTP {status}: {message}"))
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || message.to_ascii_lowercase().contains("signature")
    {
        LedgerError::Unauthorized(format!("{endpoint}: HTTP {status}: {message}"))
    } else if status.is_client_error() {
        LedgerError::Rejected(message)
    } else {
        LedgerError::protocol(endpoint, format!("unexpected HTTP {status}"))
    }
}
