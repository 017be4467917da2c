//! Contract gateway
//!
//! A [`ContractGateway`] is an immutable binding of an interface description
//! to one on-ledger contract address. Binding validates the address
//! syntactically and never touches the ledger; reads go through a
//! [`LedgerRpc`] and writes produce a [`PendingInvocation`] that must be
//! submitted before it has any effect.

use tracing::debug;

use crate::abi::{self, ParamKind, Token};
use crate::error::{Error, Result};
use crate::rpc::LedgerRpc;
use crate::utils::Address;

/// Whether an operation mutates ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    View,
    NonPayable,
}

/// One operation of the contract interface
#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub inputs: Vec<ParamKind>,
    pub outputs: Vec<ParamKind>,
    pub mutability: StateMutability,
}

/// The fixed interface description a gateway is bound to
#[derive(Debug, Clone, Default)]
pub struct InterfaceDescription {
    functions: Vec<FunctionDescriptor>,
}

impl InterfaceDescription {
    pub fn new(functions: Vec<FunctionDescriptor>) -> Self {
        Self { functions }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn functions(&self) -> &[FunctionDescriptor] {
        &self.functions
    }
}

/// The governance contract interface: two mutating operations and three views
pub fn governance_interface() -> InterfaceDescription {
    use ParamKind::*;
    InterfaceDescription::new(vec![
        FunctionDescriptor {
            name: "createProposal".to_string(),
            inputs: vec![Utf8String, Utf8String],
            outputs: vec![],
            mutability: StateMutability::NonPayable,
        },
        FunctionDescriptor {
            name: "vote".to_string(),
            inputs: vec![Uint256, Bool],
            outputs: vec![],
            mutability: StateMutability::NonPayable,
        },
        FunctionDescriptor {
            name: "getProposal".to_string(),
            inputs: vec![Uint256],
            outputs: vec![Utf8String, Utf8String, Uint256, Uint256, Bool],
            mutability: StateMutability::View,
        },
        FunctionDescriptor {
            name: "getProposalCount".to_string(),
            inputs: vec![],
            outputs: vec![Uint256],
            mutability: StateMutability::View,
        },
        FunctionDescriptor {
            name: "hasVoted".to_string(),
            inputs: vec![Uint256, Address],
            outputs: vec![Bool],
            mutability: StateMutability::View,
        },
    ])
}

/// A write-operation invocation awaiting submission
///
/// Produced by [`ContractGateway::write`]; has no effect until handed to the
/// transaction submitter.
#[derive(Debug, Clone)]
pub struct PendingInvocation {
    pub operation: String,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Typed handle bound to one on-ledger contract address
#[derive(Debug, Clone)]
pub struct ContractGateway {
    interface: InterfaceDescription,
    address: Address,
}

/// The decoded field tuple of one proposal read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalFields {
    pub title: String,
    pub description: String,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub is_active: bool,
}

impl ContractGateway {
    /// Validate the address and bind the interface to it
    ///
    /// Binding is purely syntactic; whether the address hosts a compatible
    /// contract is only discovered by the first read against it.
    pub fn bind(interface: InterfaceDescription, address: &str) -> Result<Self> {
        let address = Address::parse(address)?;
        debug!(address = %address, "Bound contract gateway");
        Ok(Self { interface, address })
    }

    /// The bound contract address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Perform a non-mutating call and decode its typed outputs
    pub async fn read(
        &self,
        rpc: &dyn LedgerRpc,
        operation: &str,
        args: &[Token],
    ) -> Result<Vec<Token>> {
        let descriptor = self.descriptor(operation)?;
        if descriptor.mutability != StateMutability::View {
            return Err(Error::read_failed(format!(
                "operation '{}' is not a view operation",
                operation
            )));
        }

        let data = abi::encode_call(&descriptor.name, &descriptor.inputs, args)
            .map_err(|e| Error::read_failed(e.to_string()))?;
        let output = rpc.call(&self.address, &data).await?;
        abi::decode_tokens(&descriptor.outputs, &output)
            .map_err(|e| Error::read_failed(format!("{}: {}", operation, e)))
    }

    /// Build a pending invocation for a mutating operation
    ///
    /// Never touches the ledger; the invocation must be submitted to take
    /// effect.
    pub fn write(&self, operation: &str, args: &[Token]) -> Result<PendingInvocation> {
        let descriptor = self.descriptor(operation)?;
        if descriptor.mutability != StateMutability::NonPayable {
            return Err(Error::other(format!(
                "operation '{}' is a view operation and cannot be submitted",
                operation
            )));
        }

        let data = abi::encode_call(&descriptor.name, &descriptor.inputs, args)?;
        Ok(PendingInvocation {
            operation: descriptor.name.clone(),
            to: self.address.clone(),
            data,
        })
    }

    fn descriptor(&self, operation: &str) -> Result<&FunctionDescriptor> {
        self.interface
            .function(operation)
            .ok_or_else(|| Error::UnknownOperation(operation.to_string()))
    }

    // ==========================================================================
    // Typed wrappers over the governance interface
    // ==========================================================================

    /// Read the ledger's authoritative proposal counter
    pub async fn get_proposal_count(&self, rpc: &dyn LedgerRpc) -> Result<u64> {
        let tokens = self.read(rpc, "getProposalCount", &[]).await?;
        tokens
            .first()
            .ok_or_else(|| Error::read_failed("getProposalCount returned no value"))?
            .as_u64()
            .map_err(|e| Error::read_failed(e.to_string()))
    }

    /// Read one proposal's fields by id
    pub async fn get_proposal(&self, rpc: &dyn LedgerRpc, id: u64) -> Result<ProposalFields> {
        let tokens = self
            .read(rpc, "getProposal", &[Token::Uint(id as u128)])
            .await?;
        if tokens.len() != 5 {
            return Err(Error::read_failed(format!(
                "getProposal returned {} values, expected 5",
                tokens.len()
            )));
        }
        let fields = ProposalFields {
            title: tokens[0].as_string()?.to_string(),
            description: tokens[1].as_string()?.to_string(),
            yes_votes: tokens[2].as_u64()?,
            no_votes: tokens[3].as_u64()?,
            is_active: tokens[4].as_bool()?,
        };
        Ok(fields)
    }

    /// Whether `account` has voted on proposal `id`
    pub async fn has_voted(&self, rpc: &dyn LedgerRpc, id: u64, account: &Address) -> Result<bool> {
        let tokens = self
            .read(
                rpc,
                "hasVoted",
                &[Token::Uint(id as u128), Token::Address(*account.as_bytes())],
            )
            .await?;
        tokens
            .first()
            .ok_or_else(|| Error::read_failed("hasVoted returned no value"))?
            .as_bool()
            .map_err(|e| Error::read_failed(e.to_string()))
    }

    /// Build the createProposal invocation
    pub fn create_proposal(&self, title: &str, description: &str) -> Result<PendingInvocation> {
        self.write(
            "createProposal",
            &[
                Token::String(title.to_string()),
                Token::String(description.to_string()),
            ],
        )
    }

    /// Build the vote invocation
    pub fn vote(&self, id: u64, approve: bool) -> Result<PendingInvocation> {
        self.write("vote", &[Token::Uint(id as u128), Token::Bool(approve)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Receipt, TxHash};
    use async_trait::async_trait;

    struct CannedRpc {
        output: Vec<u8>,
    }

    #[async_trait]
    impl LedgerRpc for CannedRpc {
        async fn call(&self, _to: &Address, _data: &[u8]) -> Result<Vec<u8>> {
            Ok(self.output.clone())
        }

        async fn transaction_receipt(&self, _hash: &TxHash) -> Result<Option<Receipt>> {
            Ok(None)
        }
    }

    const ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn test_bind_rejects_invalid_address() {
        let err = ContractGateway::bind(governance_interface(), "banana").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_write_produces_invocation_without_ledger_contact() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        let invocation = gateway.vote(3, true).unwrap();
        assert_eq!(invocation.operation, "vote");
        assert_eq!(invocation.to.as_str(), ADDR);
        let expected = abi::selector("vote", &[ParamKind::Uint256, ParamKind::Bool]);
        assert_eq!(&invocation.data[..4], &expected);
    }

    #[test]
    fn test_unknown_operation() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        let err = gateway.write("selfDestruct", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownOperation(_)));
    }

    #[test]
    fn test_write_rejects_view_operation() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        assert!(gateway.write("getProposalCount", &[]).is_err());
    }

    #[tokio::test]
    async fn test_read_decodes_count() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        let rpc = CannedRpc {
            output: abi::encode_tokens(&[Token::Uint(4)]),
        };
        assert_eq!(gateway.get_proposal_count(&rpc).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_read_rejects_mutating_operation() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        let rpc = CannedRpc { output: vec![] };
        let err = gateway.read(&rpc, "vote", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ReadFailed(_)));
    }

    #[tokio::test]
    async fn test_read_maps_garbage_output_to_read_failed() {
        let gateway = ContractGateway::bind(governance_interface(), ADDR).unwrap();
        let rpc = CannedRpc {
            output: vec![0xff; 7],
        };
        let err = gateway.get_proposal_count(&rpc).await.unwrap_err();
        assert!(matches!(err, Error::ReadFailed(_)));
    }
}
