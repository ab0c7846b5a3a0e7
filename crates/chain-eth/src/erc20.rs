use crate::abi::{Abi, AbiEvent, AbiFunction, AbiItem, AbiParam, StateMutability};

fn function(
    name: &str,
    inputs: &[(&str, &str)],
    output: &str,
    state_mutability: StateMutability,
) -> AbiItem {
    AbiItem::Function(AbiFunction {
        name: name.to_string(),
        inputs: inputs.iter().map(|(n, t)| AbiParam::new(n, t)).collect(),
        outputs: vec![AbiParam::new("", output)],
        state_mutability,
    })
}

fn event(name: &str, inputs: &[(&str, &str, bool)]) -> AbiItem {
    AbiItem::Event(AbiEvent {
        name: name.to_string(),
        inputs: inputs
            .iter()
            .map(|(n, t, indexed)| AbiParam {
                indexed: Some(*indexed),
                ..AbiParam::new(n, t)
            })
            .collect(),
        anonymous: false,
    })
}

/// The standard ERC-20 interface description.
pub fn erc20_abi() -> Abi {
    use StateMutability::{Nonpayable, View};

    Abi::new(vec![
        function("name", &[], "string", View),
        function("symbol", &[], "string", View),
        function("decimals", &[], "uint8", View),
        function("totalSupply", &[], "uint256", View),
        function("balanceOf", &[("account", "address")], "uint256", View),
        function(
            "allowance",
            &[("owner", "address"), ("spender", "address")],
            "uint256",
            View,
        ),
        function(
            "transfer",
            &[("to", "address"), ("value", "uint256")],
            "bool",
            Nonpayable,
        ),
        function(
            "approve",
            &[("spender", "address"), ("value", "uint256")],
            "bool",
            Nonpayable,
        ),
        function(
            "transferFrom",
            &[("from", "address"), ("to", "address"), ("value", "uint256")],
            "bool",
            Nonpayable,
        ),
        event(
            "Transfer",
            &[
                ("from", "address", true),
                ("to", "address", true),
                ("value", "uint256", false),
            ],
        ),
        event(
            "Approval",
            &[
                ("owner", "address", true),
                ("spender", "address", true),
                ("value", "uint256", false),
            ],
        ),
    ])
}
