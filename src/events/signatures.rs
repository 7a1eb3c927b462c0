// Known native routine signatures
//
// One named value per routine per game. Operand fields are zeroed in the hash
// so a routine matches whatever chain, address or index it was built with.

use crate::signature::{Field, Signature};

// Chain merge: A0 = -1, A1 = chain index, A2 = offset within chain

pub static CHAIN_MERGE_MP1: Signature = Signature {
    name: "CHAIN_MERGE_MP1",
    len: 36,
    hash: "05f5387c26d8388e6d61e6a1bc1f4ce6a28fae76ea2b43e45af66190f7a319dc",
    fields: &[Field::imm16("chain", 0x0E), Field::imm16("offset", 0x16)],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x2404_FFFF, 0x2405_0000,
        0x0C03_AE98, 0x2406_0000, 0x8FBF_0010, 0x03E0_0008,
        0x27BD_0018,
    ],
};

pub static CHAIN_MERGE_MP2: Signature = Signature {
    name: "CHAIN_MERGE_MP2",
    len: 36,
    hash: "a400ea83c0d782a88aaf18333a8fc82df8359db474d3af19b52ab4bd9dd09c2a",
    fields: &[Field::imm16("chain", 0x0E), Field::imm16("offset", 0x16)],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x2404_FFFF, 0x2405_0000,
        0x0C01_97CB, 0x2406_0000, 0x8FBF_0010, 0x03E0_0008,
        0x27BD_0018,
    ],
};

pub static CHAIN_MERGE_MP3: Signature = Signature {
    name: "CHAIN_MERGE_MP3",
    len: 40,
    hash: "8dc4e967ef978f54046631560681c70c29e23c4d5acfe8be7552eeb0875b4517",
    fields: &[Field::imm16("chain", 0x0E), Field::imm16("offset", 0x12)],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x2404_FFFF, 0x2405_0000,
        0x2406_0000, 0x0C03_BCAD, 0x0000_0000, 0x8FBF_0010,
        0x03E0_0008, 0x27BD_0018,
    ],
};

// Chain split: A0 -> u16 space array, A1 -> u16 chain array

pub static CHAIN_SPLIT_MP1: Signature = Signature {
    name: "CHAIN_SPLIT_MP1",
    len: 40,
    hash: "04b42a19d7500fa152da9ef9695393bafceed4f0d13bb0744b99195d83a42f5b",
    fields: &[
        Field::imm16("spaces_hi", 0x0A),
        Field::imm16("spaces_lo", 0x0E),
        Field::imm16("chains_hi", 0x12),
        Field::imm16("chains_lo", 0x1A),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x2484_0000,
        0x3C05_0000, 0x0C03_AEC7, 0x24A5_0000, 0x8FBF_0010,
        0x03E0_0008, 0x27BD_0018,
    ],
};

pub static CHAIN_SPLIT_MP2: Signature = Signature {
    name: "CHAIN_SPLIT_MP2",
    len: 40,
    hash: "1cfae4ea1db72a288b7d32edf865fcded0d572a087aeae4cf87f1e594e27ac41",
    fields: &[
        Field::imm16("spaces_hi", 0x0A),
        Field::imm16("spaces_lo", 0x0E),
        Field::imm16("chains_hi", 0x12),
        Field::imm16("chains_lo", 0x1A),
    ],
    words: &[
        0x27BD_FFE0, 0xAFBF_0018, 0x3C04_0000, 0x2484_0000,
        0x3C05_0000, 0x0C01_9806, 0x24A5_0000, 0x8FBF_0018,
        0x03E0_0008, 0x27BD_0020,
    ],
};

pub static CHAIN_SPLIT_MP3: Signature = Signature {
    name: "CHAIN_SPLIT_MP3",
    len: 44,
    hash: "7a45ea3e7f2797fc2cf4afcaa8b881dec349134451ac4d0fca2442fc22a3f467",
    fields: &[
        Field::imm16("spaces_hi", 0x0A),
        Field::imm16("spaces_lo", 0x0E),
        Field::imm16("chains_hi", 0x12),
        Field::imm16("chains_lo", 0x16),
        Field::imm16("secondary", 0x1E),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x2484_0000,
        0x3C05_0000, 0x24A5_0000, 0x0C03_BCF6, 0x2406_0000,
        0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

// Chance time: no operands

pub static CHANCE_TIME_MP1: Signature = Signature {
    name: "CHANCE_TIME_MP1",
    len: 28,
    hash: "f4db412c4aa10812cfa30923cd3bd08ea9b231645f6bf599a5f6ec47d60c0356",
    fields: &[],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x0C03_B1BC, 0x0000_0000,
        0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static CHANCE_TIME_MP2: Signature = Signature {
    name: "CHANCE_TIME_MP2",
    len: 28,
    hash: "53bbe3e91b4d6eb66f897799143e34bdec0ef6b654128ab41b6b29f65a76ba0d",
    fields: &[],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x0C01_9B1C, 0x0000_0000,
        0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static CHANCE_TIME_MP3: Signature = Signature {
    name: "CHANCE_TIME_MP3",
    len: 28,
    hash: "f58712edef33bbd6a6b1f5c3ce09135057d624384fdd9179e73850c1ab12472b",
    fields: &[],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x0C03_C284, 0x0000_0000,
        0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

// Star space: A0 = star index

pub static STAR_MP1: Signature = Signature {
    name: "STAR_MP1",
    len: 28,
    hash: "42bbbba2aa7e25d5be7eac68b36d0e755d97eedc09b4ba8f57870a551af51555",
    fields: &[Field::imm16("star", 0x0E)],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x0C03_B275, 0x2404_0000,
        0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

// Asset slot handlers: A0 = u16 space index loaded from the slot table

pub static BOO_SLOT_MP1: Signature = Signature {
    name: "BOO_SLOT_MP1",
    len: 32,
    hash: "c928395dd7a3a895304e81ecd6971411f05cbe2a91b95aa923bf65a86f998bdf",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C03_B2CA,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static BOO_SLOT_MP2: Signature = Signature {
    name: "BOO_SLOT_MP2",
    len: 32,
    hash: "dfde95e4de9c3e86f637d253b5e1b06074bbd50ec741ff3cac54c4990e1fa090",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C01_9D51,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static BOO_SLOT_MP3: Signature = Signature {
    name: "BOO_SLOT_MP3",
    len: 32,
    hash: "b4a1160c4db8a2cd1542117cf48a327341bbf04681fe5d8e43dd99aee4382514",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C03_C6A0,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static BANK_SLOT_MP2: Signature = Signature {
    name: "BANK_SLOT_MP2",
    len: 32,
    hash: "100d95f967d628accf5ea25a2b04836ebddc3eb3efd07b257111df124e4d2349",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C01_9E74,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static BANK_SLOT_MP3: Signature = Signature {
    name: "BANK_SLOT_MP3",
    len: 32,
    hash: "5fd92e1943f52d27393ff5d3da321d9637797d2e9786cdaf172f13418b2c7e84",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C03_C70E,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static ITEM_SHOP_SLOT_MP2: Signature = Signature {
    name: "ITEM_SHOP_SLOT_MP2",
    len: 32,
    hash: "8ad83d21464dbff79846e017169a2b18875dfb0663acc5ee7bfbf8d96351cbdc",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C01_9F19,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static ITEM_SHOP_SLOT_MP3: Signature = Signature {
    name: "ITEM_SHOP_SLOT_MP3",
    len: 32,
    hash: "2e319d33c902d826328667f20e8cda3c5ffc3a17f76f79995d54828cdd6a6e11",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C03_C7A5,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static GATE_SLOT_MP3: Signature = Signature {
    name: "GATE_SLOT_MP3",
    len: 32,
    hash: "6f1975444b13b87311f80dd1fb0e4b9d65410f137d1dd26a7471b3f205cd5446",
    fields: &[
        Field::imm16("table_hi", 0x0A),
        Field::imm16("table_lo", 0x12),
    ],
    words: &[
        0x27BD_FFE8, 0xAFBF_0010, 0x3C04_0000, 0x0C03_C86C,
        0x9484_0000, 0x8FBF_0010, 0x03E0_0008, 0x27BD_0018,
    ],
};

pub static ALL_SIGNATURES: &[&Signature] = &[
    &CHAIN_MERGE_MP1,
    &CHAIN_MERGE_MP2,
    &CHAIN_MERGE_MP3,
    &CHAIN_SPLIT_MP1,
    &CHAIN_SPLIT_MP2,
    &CHAIN_SPLIT_MP3,
    &CHANCE_TIME_MP1,
    &CHANCE_TIME_MP2,
    &CHANCE_TIME_MP3,
    &STAR_MP1,
    &BOO_SLOT_MP1,
    &BOO_SLOT_MP2,
    &BOO_SLOT_MP3,
    &BANK_SLOT_MP2,
    &BANK_SLOT_MP3,
    &ITEM_SHOP_SLOT_MP2,
    &ITEM_SHOP_SLOT_MP3,
    &GATE_SLOT_MP3,
];
