// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV2Router02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function getAmountsIn(uint256 amountOut, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapTokensForExactTokens(uint256 amountOut, uint256 amountInMax, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        // ABI name is `Result`; renamed to stay clear of `core::result::Result`.
        struct Call3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Call3Result[] memory returnData);
    }

    /// Strategy contracts expose a self-multicall entry that replays each payload on itself.
    #[derive(Debug, PartialEq, Eq)]
    interface IStrategyMulticall {
        function multicall(bytes[] calldata data) external returns (bytes[] memory results);
    }

    /// Soft-failure event emitted by Compound-style markets (status stays 1).
    interface ILendingFailure {
        event Failure(uint256 error, uint256 info, uint256 detail);
    }
}
