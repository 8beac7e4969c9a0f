pub mod constant_product;

pub use constant_product::{
    BPS, apply_slippage, derive_proportional_amount, percent_from_amount, price_impact_bps,
    pro_rata_amount, quote_output, required_liquidity, scale_by, spot_price,
};
