//! Contract ABI definitions for the SAMM module, the Safe, and the proxy factory.

use alloy_sol_types::sol;

sol! {
    /// One allow-list entry: target, function selector, and ether allowance.
    #[derive(Debug, PartialEq, Eq)]
    struct TxAllowance {
        address to;
        bytes4 selector;
        uint256 amount;
    }

    /// SAMM module interface
    interface ISAMM {
        function setup(
            address safe,
            uint256 membersRoot,
            uint64 threshold,
            string calldata relayer,
            address dkimRegistry,
            TxAllowance[] calldata txAllowances
        ) external;

        /// Current message nonce; every executed message bumps it
        function getNonce() external view returns (uint256 nonce);

        function getSafe() external view returns (address safe);
        function getRelayer() external view returns (string memory relayer);
        function getThreshold() external view returns (uint64 threshold);
        function getDKIMRegistry() external view returns (address dkimRegistry);
        function getMembersRoot() external view returns (uint256 membersRoot);
        function getAllowedTxs() external view returns (TxAllowance[] memory txs);
        function allowance(address to) external view returns (uint256 amount);

        function setRelayer(string calldata relayer) external;
        function setThreshold(uint64 threshold) external;
        function setDKIMRegistry(address dkimRegistry) external;
        function setMembersRoot(uint256 membersRoot) external;
        function setTxAllowed(TxAllowance calldata txAllowance, bool isAllowed) external;
        function setAllowance(address to, uint256 amount) external;
    }

    /// Safe module manager subset
    interface ISafe {
        function enableModule(address module) external;
        function disableModule(address prevModule, address module) external;
        function getOwners() external view returns (address[] memory owners);
        function getThreshold() external view returns (uint256 threshold);
        function getModulesPaginated(address start, uint256 pageSize)
            external
            view
            returns (address[] memory array, address next);
    }

    interface ISafeProxyFactory {
        function createProxyWithNonce(
            address _singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);
    }
}
