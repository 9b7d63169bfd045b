// This file is part of Peerlink.
//
// Peerlink is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Peerlink is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Peerlink.
// If not, see https://www.gnu.org/licenses/.

use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionRequest;
use jsonrpsee::types::ErrorObjectOwned;
use peerlink_types::{
    wallet::{ForwardedRequest, SecurityRequest},
    CaipChainId, JsonRpcResponse, KnownMethod, SessionRequest,
};
use peerlink_utils::log::LogAndDrop;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    emit::SessionManagerEvent,
    error::{chain_not_recognized, invalid_params, SessionError, SessionResult},
    manager::SessionManager,
};

impl SessionManager {
    /// Handle one inbound peer request.
    ///
    /// Repeated deliveries of a live request id are ignored. Requests for a
    /// chain the origin may not use are answered with an error right away;
    /// everything else is answered here or routed to the wallet, which later
    /// calls [`SessionManager::approve`] or [`SessionManager::reject`].
    pub async fn handle_request(&self, request: SessionRequest) -> SessionResult<()> {
        let topic = self.topic();
        if request.topic != topic {
            warn!(
                "Ignoring request {} for topic {}, expected {topic}",
                request.id, request.topic
            );
            return Ok(());
        }

        if !self.registry.try_register(request.clone()) {
            debug!("Ignoring duplicate delivery of request {}", request.id);
            self.metrics.duplicate_requests.increment(1);
            return Ok(());
        }
        self.metrics.requests_received.increment(1);
        self.emit(SessionManagerEvent::ReceivedRequest {
            id: request.id,
            method: request.method.clone(),
        });
        self.begin_handling();

        let origin = request
            .verified_origin
            .clone()
            .unwrap_or_else(|| self.origin());
        let method = request.known_method();
        let is_switch = method == Some(KnownMethod::WalletSwitchEthereumChain);

        let chain_id = if is_switch {
            match request.chain_id_param() {
                Ok(id) => CaipChainId::eip155(id),
                Err(error) => {
                    self.deny(&request, invalid_params(error.to_string())).await;
                    return Ok(());
                }
            }
        } else {
            request.chain_id.clone()
        };

        if !self
            .gate
            .check_access(&origin, &chain_id, is_switch)
            .await
            .is_admitted()
        {
            self.metrics.requests_denied.increment(1);
            self.emit(SessionManagerEvent::DeniedRequest {
                id: request.id,
                chain_id: chain_id.clone(),
            });
            self.deny(&request, chain_not_recognized()).await;
            return Ok(());
        }

        self.select_origin_network(&chain_id);

        if self.settings.redirect_methods.contains(&request.method) {
            self.registry.mark_redirect_owed(request.id);
        }

        match method {
            Some(KnownMethod::WalletSwitchEthereumChain) => {
                if let Err(error) = self.approve(request.id, Value::Bool(true)).await {
                    self.reject(request.id, error).await;
                }
            }
            Some(KnownMethod::EthSendTransaction) => {
                match self.send_transaction(&request, &chain_id, &origin).await {
                    Ok(hash) => {
                        let result = Value::from(hash.to_string());
                        if let Err(error) = self.approve(request.id, result).await {
                            self.reject(request.id, error).await;
                        }
                    }
                    Err(error) => self.reject(request.id, error).await,
                }
            }
            Some(KnownMethod::EthSignTypedData) => {
                self.forward(&request, KnownMethod::EthSignTypedDataV3.as_ref(), origin);
            }
            _ => self.forward(&request, &request.method, origin),
        }

        Ok(())
    }

    async fn deny(&self, request: &SessionRequest, error: ErrorObjectOwned) {
        debug!("Denying request {}: {}", request.id, error.message());
        if self.registry.resolve(request.id).is_ok() {
            self.ctx
                .transport
                .respond(&request.topic, JsonRpcResponse::error(request.id, error))
                .await
                .warn_and_drop(format!("Failed to send denial for request {}", request.id));
        }
        self.end_handling();
    }

    /// Point the origin at `chain_id` when the wallet selects networks per
    /// origin and the origin is elsewhere
    fn select_origin_network(&self, chain_id: &CaipChainId) {
        let networks = &self.ctx.networks;
        if !networks.per_origin_enabled() {
            return;
        }
        let Some(target) = chain_id.eip155_reference() else {
            return;
        };
        if self.current_chain_id() == target {
            return;
        }
        match networks.network_client_id(target) {
            Some(client) => networks.set_network_client_for_origin(&self.hostname(), &client),
            None => warn!("No network configured for {chain_id}, keeping origin network"),
        }
    }

    async fn send_transaction(
        &self,
        request: &SessionRequest,
        chain_id: &CaipChainId,
        origin: &str,
    ) -> SessionResult<B256> {
        let tx: TransactionRequest = request
            .params
            .first()
            .cloned()
            .ok_or_else(|| SessionError::InvalidParams("missing transaction".to_string()))
            .and_then(|param| {
                serde_json::from_value(param)
                    .map_err(|e| SessionError::InvalidParams(e.to_string()))
            })?;

        let networks = &self.ctx.networks;
        let network_client_id = if networks.per_origin_enabled() {
            chain_id
                .eip155_reference()
                .and_then(|id| networks.network_client_id(id))
                .ok_or_else(|| SessionError::UnknownChain(chain_id.clone()))?
        } else {
            networks.global_network_client_id()
        };

        let submitted = self
            .ctx
            .transactions
            .submit(tx.clone(), origin, &network_client_id)
            .await?;
        self.ctx.security.validate(
            &SecurityRequest::send_transaction(request.id, origin, &tx),
            &submitted.meta,
        );

        let hash = submitted.result.await?;
        debug!("Transaction for request {} submitted: {hash}", request.id);
        Ok(hash)
    }

    fn forward(&self, request: &SessionRequest, method: &str, origin: String) {
        self.ctx.rpc_handler.forward(ForwardedRequest {
            id: request.id,
            topic: request.topic.clone(),
            method: method.to_string(),
            params: request.params.clone(),
            origin,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use peerlink_types::{wallet::TransactionError, SessionEvent};
    use serde_json::json;

    use super::*;
    use crate::test_utils::{network, request, Harness, PEER_URL};

    const TX: &str = r#"{
        "from": "0x00000000000000000000000000000000000000aa",
        "to": "0x00000000000000000000000000000000000000bb",
        "value": "0x10"
    }"#;

    fn tx_params() -> Value {
        json!([serde_json::from_str::<Value>(TX).unwrap()])
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_to_known_chain_auto_approves() {
        let harness = Harness::new();
        let test = harness.build();

        test.manager
            .handle_request(request(
                1,
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0x89" }]),
                "eip155:1",
            ))
            .await
            .unwrap();

        assert_eq!(test.recorded.results(), vec![json!(true)]);
        let updates = test.recorded.updates.lock();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].has_chain(&CaipChainId::eip155(1)));
        assert!(updates[0].has_chain(&CaipChainId::eip155(137)));
        assert_eq!(
            *test.recorded.events.lock(),
            vec![(SessionEvent::chain_changed(137), CaipChainId::eip155(137))]
        );
        assert!(!test.manager.is_handling_request());
        assert!(test.manager.registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_to_unknown_chain_is_denied() {
        let test = Harness::new().build();

        test.manager
            .handle_request(request(
                1,
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0x1869f" }]),
                "eip155:1",
            ))
            .await
            .unwrap();

        assert_eq!(
            test.recorded.errors(),
            vec![(4902, "Invalid chainId".to_string())]
        );
        assert!(test.recorded.updates.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_switch_params() {
        let test = Harness::new().build();

        test.manager
            .handle_request(request(
                1,
                "wallet_switchEthereumChain",
                json!([{ "chainId": "polygon" }]),
                "eip155:1",
            ))
            .await
            .unwrap();

        let errors = test.recorded.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, -32602);
        assert!(!test.manager.is_handling_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_request_owes_no_redirect() {
        let mut harness = Harness::new();
        harness.deeplink = true;
        let mut test = harness.build();

        test.manager
            .handle_request(request(4, "eth_sendTransaction", tx_params(), "eip155:56"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(
            test.recorded.errors(),
            vec![(4902, "Invalid chainId".to_string())]
        );
        assert!(test.recorded.submitted.lock().is_empty());
        assert!(test.recorded.hand_backs.lock().is_empty());
        assert!(!test.manager.is_handling_request());
        assert!(test
            .drain_events()
            .contains(&SessionManagerEvent::DeniedRequest {
                id: 4,
                chain_id: CaipChainId::eip155(56),
            }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_transaction_approves_with_hash() {
        let hash = B256::repeat_byte(0x22);
        let mut harness = Harness::new();
        harness.tx_result = Ok(hash);
        let test = harness.build();

        test.manager
            .handle_request(request(5, "eth_sendTransaction", tx_params(), "eip155:1"))
            .await
            .unwrap();

        assert_eq!(test.recorded.results(), vec![json!(hash.to_string())]);
        assert_eq!(
            *test.recorded.submitted.lock(),
            vec![(PEER_URL.to_string(), network(1))]
        );
        let screened = test.recorded.screened.lock();
        assert_eq!(screened.len(), 1);
        assert_eq!(screened[0].id, 5);
        assert_eq!(screened[0].origin, PEER_URL);
        assert_eq!(screened[0].method, "eth_sendTransaction");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_transaction_rejection_carries_message() {
        let mut harness = Harness::new();
        harness.tx_result = Err(TransactionError::Rejected("insufficient funds".to_string()));
        harness.deeplink = true;
        let test = harness.build();

        test.manager
            .handle_request(request(6, "eth_sendTransaction", tx_params(), "eip155:1"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(
            test.recorded.errors(),
            vec![(5000, "insufficient funds".to_string())]
        );
        assert_eq!(*test.recorded.hand_backs.lock(), vec!["minimize".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_transaction_without_params_rejects() {
        let test = Harness::new().build();

        test.manager
            .handle_request(request(7, "eth_sendTransaction", json!([]), "eip155:1"))
            .await
            .unwrap();

        assert_eq!(
            test.recorded.errors(),
            vec![(5000, "invalid params: missing transaction".to_string())]
        );
        assert!(test.recorded.submitted.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_origin_transaction_uses_chain_network() {
        let mut harness = Harness::new();
        harness.per_origin = true;
        *harness.origin_chain.lock() = Some(1);
        harness.permitted_chains = vec![1, 137];
        let test = harness.build();

        test.manager
            .handle_request(request(8, "eth_sendTransaction", tx_params(), "eip155:137"))
            .await
            .unwrap();

        assert_eq!(
            *test.recorded.origin_networks.lock(),
            vec![("dapp.example".to_string(), network(137))]
        );
        assert_eq!(
            *test.recorded.submitted.lock(),
            vec![(PEER_URL.to_string(), network(137))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_delivery_is_ignored() {
        let test = Harness::new().build();
        let req = request(9, "personal_sign", json!(["0xdead", "0xaa"]), "eip155:1");

        test.manager.handle_request(req.clone()).await.unwrap();
        test.manager.handle_request(req).await.unwrap();

        assert_eq!(test.recorded.forwarded.lock().len(), 1);
        assert_eq!(*test.recorded.loading_shown.lock(), 1);
        assert!(test.manager.is_handling_request());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_typed_data_forwarded_as_v3_with_verified_origin() {
        let test = Harness::new().build();
        let mut req = request(10, "eth_signTypedData", json!(["0xaa", {}]), "eip155:1");
        req.verified_origin = Some("https://verified.example".to_string());

        test.manager.handle_request(req).await.unwrap();

        let forwarded = test.recorded.forwarded.lock();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0].method, "eth_signTypedData_v3");
        assert_eq!(forwarded[0].origin, "https://verified.example");
        assert_eq!(forwarded[0].params, vec![json!("0xaa"), json!({})]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_methods_forwarded_verbatim() {
        let test = Harness::new().build();

        test.manager
            .handle_request(request(11, "wallet_getCapabilities", json!(["0xaa"]), "eip155:1"))
            .await
            .unwrap();

        let forwarded = test.recorded.forwarded.lock();
        assert_eq!(forwarded[0].method, "wallet_getCapabilities");
        assert_eq!(forwarded[0].origin, PEER_URL);
        assert!(test.recorded.responses.lock().is_empty());
        assert!(test.manager.registry.contains(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_for_other_topic_is_ignored() {
        let test = Harness::new().build();
        let mut req = request(12, "personal_sign", json!([]), "eip155:1");
        req.topic = "other".into();

        test.manager.handle_request(req).await.unwrap();

        assert!(test.recorded.forwarded.lock().is_empty());
        assert!(!test.manager.registry.contains(12));
    }
}
