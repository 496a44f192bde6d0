//! Solidity bindings for the contracts the gasless pipeline talks to.

use alloy_sol_types::sol;

sol! {
    /// ERC-20 token with EIP-2612 `permit` support.
    ///
    /// Only the reads needed to build a permit and check a balance are
    /// declared.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-2612>
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Permit {
        function name() external view returns (string memory);
        function version() external view returns (string memory);
        function nonces(address owner) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// ERC-4337 v0.7 `EntryPoint`, nonce read only.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }
}

sol! {
    /// Kernel v3 smart account: one-time initialization and execution.
    ///
    /// `rootValidator` is a validation id, the validator type byte followed
    /// by the validator address.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IKernel {
        function initialize(
            bytes21 rootValidator,
            address hook,
            bytes calldata validatorData,
            bytes calldata hookData,
            bytes[] calldata initConfig
        ) external;
        function execute(bytes32 execMode, bytes calldata executionCalldata) external payable;
    }
}

sol! {
    /// Kernel factory; the account address depends on the initializer
    /// calldata and the salt.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IKernelFactory {
        function createAccount(bytes calldata data, bytes32 salt) external payable returns (address);
        function getAddress(bytes calldata data, bytes32 salt) external view returns (address);
    }
}

sol! {
    /// Staked front for account factories, named as `factory` in user
    /// operations so bundlers accept the deployment.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IFactoryStaker {
        function deployWithFactory(address factory, bytes calldata createData, bytes32 salt)
            external payable returns (address);
    }
}

sol! {
    /// EIP-712 envelope a Kernel account checks ERC-1271 signatures against.
    #[derive(Debug)]
    struct Kernel {
        bytes32 hash;
    }
}

sol! {
    /// Solidity-compatible struct for the body of an EIP-6492 signature.
    #[derive(Debug)]
    struct Sig6492 {
        address factory;
        bytes   factoryCalldata;
        bytes   innerSig;
    }
}

sol! {
    /// EIP-2612 permit, as signed with EIP-712.
    #[derive(Debug)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}
