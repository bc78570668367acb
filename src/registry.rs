//! Public facade over the land registry contract.
//!
//! One method per contract function, each a thin translation layer:
//! encode arguments, delegate to the read executor or the submission
//! state machine, and fold failures into [`ClassifiedError`]. No business
//! rule is evaluated here; authorization and eligibility live in the
//! contract, and this layer must not second-guess them.

use std::sync::Arc;

use registry_signer::TransactionSigner;
use serde_json::Value;
use tracing::warn;

use crate::codec;
use crate::config::Ctx;
use crate::envelope::ContractCall;
use crate::error::ClassifiedError;
use crate::gateway::LedgerGateway;
use crate::read::read_call;
use crate::submission::{submit_contract_call, SubmissionResult};

/// Identity fields for a seller registration or update.
#[derive(Debug, Clone)]
pub struct SellerProfile {
    pub name: String,
    pub age: u32,
    pub aadhar_number: String,
    pub pan_number: String,
    pub lands_owned: String,
}

/// Identity fields for a buyer registration or update.
#[derive(Debug, Clone)]
pub struct BuyerProfile {
    pub name: String,
    pub age: u32,
    pub city: String,
    pub aadhar_number: String,
    pub pan_number: String,
    pub email: String,
}

/// Property fields shared by whole and fractional listings. Price is in
/// stroops.
#[derive(Debug, Clone)]
pub struct LandListing {
    pub area: u32,
    pub city: String,
    pub state: String,
    pub price: i128,
    pub property_pid: u32,
    pub survey_number: u32,
    pub ipfs_hash: String,
    pub document: String,
}

pub struct LandRegistry<G, S> {
    gateway: Arc<G>,
    signer: Arc<S>,
    ctx: Ctx,
}

impl<G, S> LandRegistry<G, S>
where
    G: LedgerGateway,
    S: TransactionSigner,
{
    pub fn new(gateway: Arc<G>, signer: Arc<S>, ctx: Ctx) -> Self {
        Self {
            gateway,
            signer,
            ctx,
        }
    }

    async fn submit(
        &self,
        source: &str,
        call: ContractCall,
    ) -> Result<SubmissionResult, ClassifiedError> {
        submit_contract_call(
            self.gateway.as_ref(),
            self.signer.as_ref(),
            &self.ctx,
            source,
            &call,
        )
        .await
        .map_err(ClassifiedError::from)
    }

    async fn read(&self, call: ContractCall) -> Result<Option<Value>, ClassifiedError> {
        read_call(self.gateway.as_ref(), &self.ctx, &call)
            .await
            .map_err(ClassifiedError::from)
    }

    pub async fn initialize(
        &self,
        source: &str,
        inspector_address: &str,
        name: &str,
        age: u32,
        designation: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("initialize")
            .arg(codec::address(inspector_address)?)
            .arg(codec::string(name)?)
            .arg(codec::u32(age))
            .arg(codec::string(designation)?);
        self.submit(source, call).await
    }

    pub async fn is_land_inspector(&self, address: &str) -> Result<Option<Value>, ClassifiedError> {
        let call = ContractCall::new("is_land_inspector").arg(codec::address(address)?);
        self.read(call).await
    }

    pub async fn register_seller(
        &self,
        seller: &str,
        profile: &SellerProfile,
        document: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("register_seller")
            .arg(codec::address(seller)?)
            .arg(codec::string(&profile.name)?)
            .arg(codec::u32(profile.age))
            .arg(codec::string(&profile.aadhar_number)?)
            .arg(codec::string(&profile.pan_number)?)
            .arg(codec::string(&profile.lands_owned)?)
            .arg(codec::string(document)?);
        self.submit(seller, call).await
    }

    pub async fn update_seller(
        &self,
        seller: &str,
        profile: &SellerProfile,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("update_seller")
            .arg(codec::address(seller)?)
            .arg(codec::string(&profile.name)?)
            .arg(codec::u32(profile.age))
            .arg(codec::string(&profile.aadhar_number)?)
            .arg(codec::string(&profile.pan_number)?)
            .arg(codec::string(&profile.lands_owned)?);
        self.submit(seller, call).await
    }

    pub async fn get_seller(&self, address: &str) -> Result<Option<Value>, ClassifiedError> {
        let call = ContractCall::new("get_seller").arg(codec::address(address)?);
        self.read(call).await
    }

    pub async fn register_buyer(
        &self,
        buyer: &str,
        profile: &BuyerProfile,
        document: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("register_buyer")
            .arg(codec::address(buyer)?)
            .arg(codec::string(&profile.name)?)
            .arg(codec::u32(profile.age))
            .arg(codec::string(&profile.city)?)
            .arg(codec::string(&profile.aadhar_number)?)
            .arg(codec::string(&profile.pan_number)?)
            .arg(codec::string(document)?)
            .arg(codec::string(&profile.email)?);
        self.submit(buyer, call).await
    }

    pub async fn update_buyer(
        &self,
        buyer: &str,
        profile: &BuyerProfile,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("update_buyer")
            .arg(codec::address(buyer)?)
            .arg(codec::string(&profile.name)?)
            .arg(codec::u32(profile.age))
            .arg(codec::string(&profile.city)?)
            .arg(codec::string(&profile.aadhar_number)?)
            .arg(codec::string(&profile.pan_number)?)
            .arg(codec::string(&profile.email)?);
        self.submit(buyer, call).await
    }

    pub async fn get_buyer(&self, address: &str) -> Result<Option<Value>, ClassifiedError> {
        let call = ContractCall::new("get_buyer").arg(codec::address(address)?);
        self.read(call).await
    }

    pub async fn verify_seller(
        &self,
        inspector: &str,
        seller: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("verify_seller")
            .arg(codec::address(inspector)?)
            .arg(codec::address(seller)?);
        self.submit(inspector, call).await
    }

    pub async fn reject_seller(
        &self,
        inspector: &str,
        seller: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("reject_seller")
            .arg(codec::address(inspector)?)
            .arg(codec::address(seller)?);
        self.submit(inspector, call).await
    }

    pub async fn verify_buyer(
        &self,
        inspector: &str,
        buyer: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("verify_buyer")
            .arg(codec::address(inspector)?)
            .arg(codec::address(buyer)?);
        self.submit(inspector, call).await
    }

    pub async fn reject_buyer(
        &self,
        inspector: &str,
        buyer: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("reject_buyer")
            .arg(codec::address(inspector)?)
            .arg(codec::address(buyer)?);
        self.submit(inspector, call).await
    }

    pub async fn add_land(
        &self,
        seller: &str,
        listing: &LandListing,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("add_land")
            .arg(codec::address(seller)?)
            .arg(codec::u32(listing.area))
            .arg(codec::string(&listing.city)?)
            .arg(codec::string(&listing.state)?)
            .arg(codec::i128(listing.price))
            .arg(codec::u32(listing.property_pid))
            .arg(codec::u32(listing.survey_number))
            .arg(codec::string(&listing.ipfs_hash)?)
            .arg(codec::string(&listing.document)?);
        self.submit(seller, call).await
    }

    pub async fn add_fractional_land(
        &self,
        seller: &str,
        listing: &LandListing,
        total_fractions: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("add_fractional_land")
            .arg(codec::address(seller)?)
            .arg(codec::u32(listing.area))
            .arg(codec::string(&listing.city)?)
            .arg(codec::string(&listing.state)?)
            .arg(codec::i128(listing.price))
            .arg(codec::u32(listing.property_pid))
            .arg(codec::u32(listing.survey_number))
            .arg(codec::string(&listing.ipfs_hash)?)
            .arg(codec::string(&listing.document)?)
            .arg(codec::u32(total_fractions));
        self.submit(seller, call).await
    }

    pub async fn verify_land(
        &self,
        inspector: &str,
        land_id: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("verify_land")
            .arg(codec::address(inspector)?)
            .arg(codec::u32(land_id));
        self.submit(inspector, call).await
    }

    pub async fn get_land(&self, land_id: u32) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("get_land").arg(codec::u32(land_id)))
            .await
    }

    pub async fn get_lands_count(&self) -> Result<u32, ClassifiedError> {
        let value = self.read(ContractCall::new("get_lands_count")).await?;
        Ok(decode_count(value))
    }

    pub async fn is_land_verified(&self, land_id: u32) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("is_land_verified").arg(codec::u32(land_id)))
            .await
    }

    pub async fn request_land(
        &self,
        buyer: &str,
        seller: &str,
        land_id: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("request_land")
            .arg(codec::address(buyer)?)
            .arg(codec::address(seller)?)
            .arg(codec::u32(land_id));
        self.submit(buyer, call).await
    }

    pub async fn request_fractional_land(
        &self,
        buyer: &str,
        seller: &str,
        land_id: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("request_fractional_land")
            .arg(codec::address(buyer)?)
            .arg(codec::address(seller)?)
            .arg(codec::u32(land_id));
        self.submit(buyer, call).await
    }

    pub async fn approve_request(
        &self,
        seller: &str,
        request_id: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("approve_request")
            .arg(codec::address(seller)?)
            .arg(codec::u32(request_id));
        self.submit(seller, call).await
    }

    pub async fn make_payment(
        &self,
        buyer: &str,
        request_id: u32,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("payment")
            .arg(codec::address(buyer)?)
            .arg(codec::u32(request_id));
        self.submit(buyer, call).await
    }

    pub async fn get_request(&self, request_id: u32) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("get_request").arg(codec::u32(request_id)))
            .await
    }

    pub async fn get_requests_count(&self) -> Result<u32, ClassifiedError> {
        let value = self.read(ContractCall::new("get_requests_count")).await?;
        Ok(decode_count(value))
    }

    pub async fn get_fractional_ownership(
        &self,
        land_id: u32,
        fraction_id: u32,
    ) -> Result<Option<Value>, ClassifiedError> {
        let call = ContractCall::new("get_fractional_ownership")
            .arg(codec::u32(land_id))
            .arg(codec::u32(fraction_id));
        self.read(call).await
    }

    pub async fn get_land_fraction_owners(
        &self,
        land_id: u32,
    ) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("get_land_fraction_owners").arg(codec::u32(land_id)))
            .await
    }

    pub async fn get_user_fractional_lands(
        &self,
        address: &str,
    ) -> Result<Option<Value>, ClassifiedError> {
        let call = ContractCall::new("get_user_fractional_lands").arg(codec::address(address)?);
        self.read(call).await
    }

    pub async fn get_available_fractions(
        &self,
        land_id: u32,
    ) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("get_available_fractions").arg(codec::u32(land_id)))
            .await
    }

    pub async fn transfer_ownership(
        &self,
        inspector: &str,
        land_id: u32,
        new_owner: &str,
    ) -> Result<SubmissionResult, ClassifiedError> {
        let call = ContractCall::new("transfer_ownership")
            .arg(codec::address(inspector)?)
            .arg(codec::u32(land_id))
            .arg(codec::address(new_owner)?);
        self.submit(inspector, call).await
    }

    pub async fn get_land_owner(&self, land_id: u32) -> Result<Option<Value>, ClassifiedError> {
        self.read(ContractCall::new("get_land_owner").arg(codec::u32(land_id)))
            .await
    }

    /// Fetches every registered land sequentially by ascending id.
    /// Missing ids (aborted lookups) are skipped rather than failing the
    /// whole listing.
    pub async fn get_all_lands(&self) -> Result<Vec<Value>, ClassifiedError> {
        let count = self.get_lands_count().await?;
        let mut lands = Vec::with_capacity(count as usize);
        for id in 1..=count {
            match self.get_land(id).await {
                Ok(Some(land)) => lands.push(with_id(id, land)),
                Ok(None) => {}
                Err(err) => warn!(land_id = id, %err, "skipping unreadable land record"),
            }
        }
        Ok(lands)
    }

    /// Fetches every purchase request sequentially by ascending id.
    pub async fn get_all_requests(&self) -> Result<Vec<Value>, ClassifiedError> {
        let count = self.get_requests_count().await?;
        let mut requests = Vec::with_capacity(count as usize);
        for id in 1..=count {
            match self.get_request(id).await {
                Ok(Some(request)) => requests.push(with_id(id, request)),
                Ok(None) => {}
                Err(err) => warn!(request_id = id, %err, "skipping unreadable request record"),
            }
        }
        Ok(requests)
    }
}

fn decode_count(value: Option<Value>) -> u32 {
    value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0)
}

/// Attaches the numeric registry id to a decoded record for display.
fn with_id(id: u32, value: Value) -> Value {
    match value {
        Value::Object(mut fields) => {
            fields.insert("id".to_string(), id.into());
            Value::Object(fields)
        }
        other => serde_json::json!({ "id": id, "value": other }),
    }
}
