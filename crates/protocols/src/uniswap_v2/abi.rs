//! Uniswap V2 factory, pair, router and ERC-20 interfaces.
//!
//! The interfaces are declared with `sol!`; [`encode_call`] and [`decode_output`]
//! bridge the typed call structs to the name-plus-[`AbiValue`] form that crosses
//! the ledger seam.

use crate::ledger::AbiValue;
use alloy::primitives::{Address, U256 as AbiU256, hex};
use alloy::sol;
use alloy::sol_types::SolCall;
use primitive_types::U256;
use thiserror::Error;

sol! {
    interface IERC20 {
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }

    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
        function allPairs(uint256 index) external view returns (address pair);
        function allPairsLength() external view returns (uint256);
    }

    interface IUniswapV2Pair {
        event Swap(
            address indexed sender,
            uint256 amount0In,
            uint256 amount1In,
            uint256 amount0Out,
            uint256 amount1Out,
            address indexed to
        );

        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Router02 {
        function addLiquidity(
            address tokenA,
            address tokenB,
            uint256 amountADesired,
            uint256 amountBDesired,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

        function addLiquidityETH(
            address token,
            uint256 amountTokenDesired,
            uint256 amountTokenMin,
            uint256 amountETHMin,
            address to,
            uint256 deadline
        ) external payable returns (uint256 amountToken, uint256 amountETH, uint256 liquidity);

        function removeLiquidity(
            address tokenA,
            address tokenB,
            uint256 liquidity,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB);

        function removeLiquidityETH(
            address token,
            uint256 liquidity,
            uint256 amountTokenMin,
            uint256 amountETHMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountToken, uint256 amountETH);

        function swapExactTokensForTokensSupportingFeeOnTransferTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external;

        function swapExactETHForTokensSupportingFeeOnTransferTokens(
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external payable;

        function swapExactTokensForETHSupportingFeeOnTransferTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external;
    }
}

use IERC20::{
    allowanceCall, approveCall, balanceOfCall, decimalsCall, symbolCall, totalSupplyCall,
};
use IUniswapV2Factory::{allPairsCall, allPairsLengthCall, getPairCall};
use IUniswapV2Pair::{getReservesCall, token0Call, token1Call};
use IUniswapV2Router02::{
    addLiquidityCall, addLiquidityETHCall, removeLiquidityCall, removeLiquidityETHCall,
    swapExactETHForTokensSupportingFeeOnTransferTokensCall,
    swapExactTokensForETHSupportingFeeOnTransferTokensCall,
    swapExactTokensForTokensSupportingFeeOnTransferTokensCall,
};

/// Errors raised while encoding calldata or decoding return data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("Unknown contract function: {0}")]
    UnknownFunction(String),
    #[error("{function} is missing argument {index}")]
    MissingArgument { function: String, index: usize },
    #[error("{function} argument {index} must be {expected}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: &'static str,
    },
    #[error("{function} takes {expected} arguments, got more")]
    ExtraArguments { function: String, expected: usize },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("ABI decoding failed: {0}")]
    Decode(String),
}

impl From<alloy::sol_types::Error> for AbiError {
    fn from(e: alloy::sol_types::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Parses a 20-byte hex address, with or without `0x`.
///
/// # Errors
/// Returns [`AbiError::InvalidAddress`] for anything that is not 40 hex digits.
pub fn parse_address(raw: &str) -> Result<Address, AbiError> {
    raw.parse::<Address>()
        .map_err(|_| AbiError::InvalidAddress(raw.to_string()))
}

/// Whether `raw` is a syntactically valid address.
pub fn is_address(raw: &str) -> bool {
    parse_address(raw).is_ok()
}

/// Lower-case `0x` form of an address.
pub fn format_address(address: Address) -> String {
    hex::encode_prefixed(address)
}

/// Whether `raw` is the zero address.
pub fn is_zero_address(raw: &str) -> bool {
    parse_address(raw).is_ok_and(|address| address.is_zero())
}

pub(crate) fn to_abi_u256(value: U256) -> AbiU256 {
    AbiU256::from_be_bytes(value.to_big_endian())
}

pub(crate) fn from_abi_u256(value: AbiU256) -> U256 {
    U256::from_big_endian(&value.to_be_bytes::<32>())
}

/// Positional reader over the arguments of one call.
struct Args<'a> {
    function: &'a str,
    values: &'a [AbiValue],
    next: usize,
}

impl<'a> Args<'a> {
    fn new(function: &'a str, values: &'a [AbiValue]) -> Self {
        Self {
            function,
            values,
            next: 0,
        }
    }

    fn take(&mut self) -> Result<(usize, &'a AbiValue), AbiError> {
        let index = self.next;
        let value = self.values.get(index).ok_or_else(|| AbiError::MissingArgument {
            function: self.function.to_string(),
            index,
        })?;
        self.next += 1;
        Ok((index, value))
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> AbiError {
        AbiError::ArgumentType {
            function: self.function.to_string(),
            index,
            expected,
        }
    }

    fn address(&mut self) -> Result<Address, AbiError> {
        match self.take()? {
            (_, AbiValue::Address(raw)) => parse_address(raw),
            (index, _) => Err(self.mismatch(index, "address")),
        }
    }

    fn uint(&mut self) -> Result<AbiU256, AbiError> {
        match self.take()? {
            (_, AbiValue::Uint(value)) => Ok(to_abi_u256(*value)),
            (index, _) => Err(self.mismatch(index, "uint256")),
        }
    }

    fn path(&mut self) -> Result<Vec<Address>, AbiError> {
        match self.take()? {
            (_, AbiValue::AddressArray(items)) => items.iter().map(|a| parse_address(a)).collect(),
            (index, _) => Err(self.mismatch(index, "address[]")),
        }
    }

    fn finish(self) -> Result<(), AbiError> {
        if self.next < self.values.len() {
            return Err(AbiError::ExtraArguments {
                function: self.function.to_string(),
                expected: self.next,
            });
        }
        Ok(())
    }
}

/// Encodes a call to `function` with `args`: selector followed by the arguments.
///
/// # Errors
/// Returns an error if the function is unknown, the arguments do not match its
/// inputs, or an address is malformed.
pub fn encode_call(function: &str, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let mut a = Args::new(function, args);
    let data = match function {
        "symbol" => symbolCall {}.abi_encode(),
        "decimals" => decimalsCall {}.abi_encode(),
        "totalSupply" => totalSupplyCall {}.abi_encode(),
        "balanceOf" => balanceOfCall { owner: a.address()? }.abi_encode(),
        "allowance" => allowanceCall {
            owner: a.address()?,
            spender: a.address()?,
        }
        .abi_encode(),
        "approve" => approveCall {
            spender: a.address()?,
            value: a.uint()?,
        }
        .abi_encode(),
        "getPair" => getPairCall {
            tokenA: a.address()?,
            tokenB: a.address()?,
        }
        .abi_encode(),
        "allPairs" => allPairsCall { index: a.uint()? }.abi_encode(),
        "allPairsLength" => allPairsLengthCall {}.abi_encode(),
        "token0" => token0Call {}.abi_encode(),
        "token1" => token1Call {}.abi_encode(),
        "getReserves" => getReservesCall {}.abi_encode(),
        "addLiquidity" => addLiquidityCall {
            tokenA: a.address()?,
            tokenB: a.address()?,
            amountADesired: a.uint()?,
            amountBDesired: a.uint()?,
            amountAMin: a.uint()?,
            amountBMin: a.uint()?,
            to: a.address()?,
            deadline: a.uint()?,
        }
        .abi_encode(),
        "addLiquidityETH" => addLiquidityETHCall {
            token: a.address()?,
            amountTokenDesired: a.uint()?,
            amountTokenMin: a.uint()?,
            amountETHMin: a.uint()?,
            to: a.address()?,
            deadline: a.uint()?,
        }
        .abi_encode(),
        "removeLiquidity" => removeLiquidityCall {
            tokenA: a.address()?,
            tokenB: a.address()?,
            liquidity: a.uint()?,
            amountAMin: a.uint()?,
            amountBMin: a.uint()?,
            to: a.address()?,
            deadline: a.uint()?,
        }
        .abi_encode(),
        "removeLiquidityETH" => removeLiquidityETHCall {
            token: a.address()?,
            liquidity: a.uint()?,
            amountTokenMin: a.uint()?,
            amountETHMin: a.uint()?,
            to: a.address()?,
            deadline: a.uint()?,
        }
        .abi_encode(),
        "swapExactTokensForTokensSupportingFeeOnTransferTokens" => {
            swapExactTokensForTokensSupportingFeeOnTransferTokensCall {
                amountIn: a.uint()?,
                amountOutMin: a.uint()?,
                path: a.path()?,
                to: a.address()?,
                deadline: a.uint()?,
            }
            .abi_encode()
        }
        "swapExactETHForTokensSupportingFeeOnTransferTokens" => {
            swapExactETHForTokensSupportingFeeOnTransferTokensCall {
                amountOutMin: a.uint()?,
                path: a.path()?,
                to: a.address()?,
                deadline: a.uint()?,
            }
            .abi_encode()
        }
        "swapExactTokensForETHSupportingFeeOnTransferTokens" => {
            swapExactTokensForETHSupportingFeeOnTransferTokensCall {
                amountIn: a.uint()?,
                amountOutMin: a.uint()?,
                path: a.path()?,
                to: a.address()?,
                deadline: a.uint()?,
            }
            .abi_encode()
        }
        _ => return Err(AbiError::UnknownFunction(function.to_string())),
    };
    a.finish()?;
    Ok(data)
}

fn uint(value: AbiU256) -> AbiValue {
    AbiValue::Uint(from_abi_u256(value))
}

fn address(value: Address) -> AbiValue {
    AbiValue::Address(format_address(value))
}

/// Decodes the return data of `function`.
///
/// # Errors
/// Returns an error if the function is unknown or the data does not match its
/// declared outputs.
pub fn decode_output(function: &str, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let values = match function {
        "symbol" => vec![AbiValue::String(symbolCall::abi_decode_returns(data)?)],
        "decimals" => vec![AbiValue::uint(decimalsCall::abi_decode_returns(data)?)],
        "totalSupply" => vec![uint(totalSupplyCall::abi_decode_returns(data)?)],
        "balanceOf" => vec![uint(balanceOfCall::abi_decode_returns(data)?)],
        "allowance" => vec![uint(allowanceCall::abi_decode_returns(data)?)],
        "approve" => vec![AbiValue::Bool(approveCall::abi_decode_returns(data)?)],
        "getPair" => vec![address(getPairCall::abi_decode_returns(data)?)],
        "allPairs" => vec![address(allPairsCall::abi_decode_returns(data)?)],
        "allPairsLength" => vec![uint(allPairsLengthCall::abi_decode_returns(data)?)],
        "token0" => vec![address(token0Call::abi_decode_returns(data)?)],
        "token1" => vec![address(token1Call::abi_decode_returns(data)?)],
        "getReserves" => {
            let reserves = getReservesCall::abi_decode_returns(data)?;
            vec![
                AbiValue::uint(reserves.reserve0.to::<u128>()),
                AbiValue::uint(reserves.reserve1.to::<u128>()),
                AbiValue::uint(reserves.blockTimestampLast),
            ]
        }
        "addLiquidity" => {
            let out = addLiquidityCall::abi_decode_returns(data)?;
            vec![uint(out.amountA), uint(out.amountB), uint(out.liquidity)]
        }
        "addLiquidityETH" => {
            let out = addLiquidityETHCall::abi_decode_returns(data)?;
            vec![uint(out.amountToken), uint(out.amountETH), uint(out.liquidity)]
        }
        "removeLiquidity" => {
            let out = removeLiquidityCall::abi_decode_returns(data)?;
            vec![uint(out.amountA), uint(out.amountB)]
        }
        "removeLiquidityETH" => {
            let out = removeLiquidityETHCall::abi_decode_returns(data)?;
            vec![uint(out.amountToken), uint(out.amountETH)]
        }
        "swapExactTokensForTokensSupportingFeeOnTransferTokens"
        | "swapExactETHForTokensSupportingFeeOnTransferTokens"
        | "swapExactTokensForETHSupportingFeeOnTransferTokens" => vec![],
        _ => return Err(AbiError::UnknownFunction(function.to_string())),
    };
    Ok(values)
}
