use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::types::{
    AuthorizationRef, CaptureResult, ChargeIntent, GatewayKind, GatewayName, OrderRef,
    PaymentRequest, PaymentStatus, WebhookEvent, WebhookVerificationResult,
};
use async_trait::async_trait;

/// One capability set shared by every gateway.
///
/// Delayed-capture gateways implement the order/authorize/capture/void half,
/// immediate-capture gateways the charge half. Anything a gateway leaves
/// unimplemented answers `UnsupportedOperation` without touching the network.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> GatewayName;

    fn kind(&self) -> GatewayKind;

    /// Whether credentials are present. Unconfigured gateways still answer,
    /// with `MissingCredentials`.
    fn is_configured(&self) -> bool;

    async fn create_authorization(&self, request: &PaymentRequest) -> PaymentResult<OrderRef> {
        let _ = request;
        Err(unsupported(self.name(), "create_authorization"))
    }

    async fn authorize_order(&self, order_id: &str) -> PaymentResult<AuthorizationRef> {
        let _ = order_id;
        Err(unsupported(self.name(), "authorize_order"))
    }

    async fn capture(&self, authorization_id: &str) -> PaymentResult<CaptureResult> {
        let _ = authorization_id;
        Err(unsupported(self.name(), "capture"))
    }

    async fn void(&self, authorization_id: &str) -> PaymentResult<PaymentStatus> {
        let _ = authorization_id;
        Err(unsupported(self.name(), "void"))
    }

    async fn create_immediate_charge(
        &self,
        request: &PaymentRequest,
    ) -> PaymentResult<ChargeIntent> {
        let _ = request;
        Err(unsupported(self.name(), "create_immediate_charge"))
    }

    async fn retrieve_charge(&self, charge_id: &str) -> PaymentResult<ChargeIntent> {
        let _ = charge_id;
        Err(unsupported(self.name(), "retrieve_charge"))
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookVerificationResult> {
        let _ = (payload, signature);
        Err(unsupported(self.name(), "verify_webhook"))
    }

    fn parse_webhook_event(&self, payload: &[u8]) -> PaymentResult<WebhookEvent> {
        let _ = payload;
        Err(unsupported(self.name(), "parse_webhook_event"))
    }
}

pub(crate) fn unsupported(gateway: GatewayName, operation: &'static str) -> PaymentError {
    PaymentError::UnsupportedOperation {
        gateway: gateway.to_string(),
        operation,
    }
}
