/* Well-known annotation ids understood by the C generator (c++.capnp style `$C::...`) */

/* $C::namespace("prefix_") on a file */
pub const NAMESPACE: u64 = 0xf2c035025fec7c2b;
/* $C::fieldgetset on a file */
pub const FIELDGETSET: u64 = 0xf72bc690355d66de;
/* $C::donotinclude(0x...) on a file */
pub const DONOTINCLUDE: u64 = 0x8c99797357b357e9;
/* $C::typedefto("alias") on a struct or enum */
pub const TYPEDEFTO: u64 = 0xcefaf27713042144;
/* $C::extraheader("#include ...") on a file */
pub const EXTRAHEADER: u64 = 0xbadb496d09cf4612;
/* $C::extendedattribute("...") on a file */
pub const EXTENDEDATTRIBUTE: u64 = 0xd187bca5c6844c24;
/* $C::codecgen on a file */
pub const CODECGEN: u64 = 0xcccaac86283e2609;
/* $C::mapname("...") on a struct, group or field */
pub const MAPNAME: u64 = 0xb9edf6fc2d8972b8;
/* $C::nameinfix("-c") on a file */
pub const NAMEINFIX: u64 = 0x85a8d86d736ba637;
/* $C::maplistcount("...") on a list field */
pub const MAPLISTCOUNT: u64 = 0xb6ea49eb8a9b0f9e;
/* $C::mapuniontag("...") on a struct or group field */
pub const MAPUNIONTAG: u64 = 0xdce06d41858f91ac;
