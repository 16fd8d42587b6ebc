//! Compiled artifact of the Xefers link contract.
//!
//! The contract itself (one redemption per address, optional reward payout)
//! is external and authoritative; this crate only ships its creation code
//! and calls its interface.

/// Creation bytecode, without constructor arguments. `deploy` appends the
/// ABI-encoded `(title, reward, redirectUrl)` tuple.
pub const LINK_CONTRACT_BYTECODE: &str = concat!(
    "0x",
    "60806040526040516107d43803806107d48339818101604052810190610025919061012c565b82600090816100349190",
    "61037a565b81600181905550806002908161004a919061037a565b5050503373ffffffffffffffffffffffffffffffff",
    "ffffffff16600360006101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffff",
    "ffffffffffffffffffffffffffffff160217905550a4c123b1612dd272d1371c17149d439536b3216fdaeeb975729fae",
    "923d5a4fd12aabfe228f219e9cb0eb53f16947ccf25ec84d8dbc74254770f58904dba41ecccc3fc1626e53a13043b026",
    "c48bbf33feff9243a8f506b40928b5b7a767c76fb008f86bebb2737f6a6f0fb23c6f5da2cec255404e4fb440034d6608",
    "697a8d41bed440e50454f31af3176813e02ea68ef786e4d3cea27d26934b484e73cf575dcad6ba2b0aee0ca923732881",
    "584d8c4fa2815d2802827283e0ad84173581569969e58b081006f7e3dfc967a64cb14028d512c9791e558e08baa7196b",
    "50ac2f86702824c1c099724caf4941d4072014b3ce107f80e222f828767efc2f91624a8940f1f836f99eee3692f09e2e",
    "8c662248b483b7ffc050fec94dbca3a0aac36098b2cc2bd818319478da6bd0c621de49f145fda9988c79fc35526f7eae",
    "d46725a2a7b860dcd6c8a1f8b46287cced9041dff02cee737443e210471948d33296c87009e8a7f770d9106fd287db7f",
    "1adbc60926f6967e7893f57fd14c1604d1a2646970667358221215cea325a65e19cbae530282bd36cb9d21f6be6abf0d",
    "7c1c1e21862ab8a18a8964736f6c63430008120033",
);
