//! Transfer Events
//!
//! Ordered, append-only progress reports emitted while a transfer runs.
//! Every event carries a UTC timestamp; status changes carry an optional
//! phase payload (message, MPC round counters).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transfer::TransferStatus;

/// Kind of artifact announced by a `proof_generated` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofKind {
    Commitment,
    ZkProof,
    MpcResult,
    Encryption,
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Commitment => "commitment",
            Self::ZkProof => "zk_proof",
            Self::MpcResult => "mpc_result",
            Self::Encryption => "encryption",
        };
        write!(f, "{}", s)
    }
}

/// Phase payload of a status change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpc_round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rounds: Option<u32>,
}

impl StatusData {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn round(message: impl Into<String>, round: u32, total: u32) -> Self {
        Self {
            message: Some(message.into()),
            mpc_round: Some(round),
            total_rounds: Some(total),
        }
    }
}

/// A single progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    StatusChange {
        status: TransferStatus,
        #[serde(default)]
        data: StatusData,
        timestamp: DateTime<Utc>,
    },
    TxSubmitted {
        #[serde(rename = "txHash")]
        tx_hash: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        timestamp: DateTime<Utc>,
    },
    TxConfirmed {
        #[serde(rename = "txHash")]
        tx_hash: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        timestamp: DateTime<Utc>,
    },
    ProofGenerated {
        kind: ProofKind,
        value: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TransferEvent {
    pub fn status_change(status: TransferStatus, data: StatusData) -> Self {
        Self::StatusChange {
            status,
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn tx_submitted(tx_hash: impl Into<String>, label: Option<&str>) -> Self {
        Self::TxSubmitted {
            tx_hash: tx_hash.into(),
            label: label.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn tx_confirmed(tx_hash: impl Into<String>, label: Option<&str>) -> Self {
        Self::TxConfirmed {
            tx_hash: tx_hash.into(),
            label: label.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    pub fn proof_generated(kind: ProofKind, value: impl Into<String>) -> Self {
        Self::ProofGenerated {
            kind,
            value: value.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StatusChange { timestamp, .. }
            | Self::TxSubmitted { timestamp, .. }
            | Self::TxConfirmed { timestamp, .. }
            | Self::ProofGenerated { timestamp, .. }
            | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Status carried by a status change, if this is one
    pub fn status(&self) -> Option<TransferStatus> {
        match self {
            Self::StatusChange { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a `success` or `failed` status change
    pub fn is_terminal(&self) -> bool {
        self.status().map_or(false, |s| s.is_terminal())
    }

    /// Wire tag of the event
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StatusChange { .. } => "status_change",
            Self::TxSubmitted { .. } => "tx_submitted",
            Self::TxConfirmed { .. } => "tx_confirmed",
            Self::ProofGenerated { .. } => "proof_generated",
            Self::Error { .. } => "error",
        }
    }
}
