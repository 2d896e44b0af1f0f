use serde::{Deserialize, Serialize};

use crate::domain::{Address, ChainId, PostId};

/// Contract method invocation as carried to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ContractCall {
    GetUserProfile {
        address: Address,
    },
    GetPostIds,
    GetPost {
        #[serde(rename = "postId")]
        post_id: PostId,
    },
    CreatePost {
        from: Address,
        content: String,
    },
    ToggleLikePost {
        from: Address,
        #[serde(rename = "postId")]
        post_id: PostId,
    },
    SubmitComment {
        from: Address,
        #[serde(rename = "postId")]
        post_id: PostId,
        content: String,
    },
}

impl ContractCall {
    pub fn method_name(&self) -> &'static str {
        match self {
            ContractCall::GetUserProfile { .. } => "getUserProfile",
            ContractCall::GetPostIds => "getPostIds",
            ContractCall::GetPost { .. } => "getPost",
            ContractCall::CreatePost { .. } => "createPost",
            ContractCall::ToggleLikePost { .. } => "toggleLikePost",
            ContractCall::SubmitComment { .. } => "submitComment",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ContractCall::CreatePost { .. }
                | ContractCall::ToggleLikePost { .. }
                | ContractCall::SubmitComment { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse<T> {
    pub result: T,
}

/// Acknowledgement of a state-changing call once it has been mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// Notifications pushed by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_call_uses_contract_method_names_on_the_wire() {
        let call = ContractCall::ToggleLikePost {
            from: "0x00000000000000000000000000000000000000aa"
                .parse()
                .expect("address"),
            post_id: PostId(7),
        };
        let value = serde_json::to_value(&call).expect("serialize");
        assert_eq!(value["method"], "toggleLikePost");
        assert_eq!(value["params"]["postId"], 7);
        assert_eq!(
            value["params"]["from"],
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(call.method_name(), "toggleLikePost");
        assert!(call.is_write());
    }

    #[test]
    fn unit_call_has_no_params() {
        let value = serde_json::to_value(ContractCall::GetPostIds).expect("serialize");
        assert_eq!(value, serde_json::json!({ "method": "getPostIds" }));
        assert!(!ContractCall::GetPostIds.is_write());
    }
}
