// Shared cipher fixtures for integration tests.
#![allow(dead_code)]

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use flowrs::BlockCipher;

/// Keystream-XOR cipher; its own inverse, so one value serves both
/// directions.
pub struct XorCipher {
    key: Vec<u8>,
}

impl XorCipher {
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }
}

impl BlockCipher for XorCipher {
    fn block_size(&self) -> usize {
        self.key.len()
    }

    fn process_block(&mut self, block: &mut [u8]) {
        for (byte, k) in block.iter_mut().zip(&self.key) {
            *byte ^= k;
        }
    }
}

/// AES-128 pre-keyed for encryption.
pub struct AesEncrypt(Aes128);

impl AesEncrypt {
    pub fn new(key: &[u8; 16]) -> Self {
        Self(Aes128::new(GenericArray::from_slice(key)))
    }
}

impl BlockCipher for AesEncrypt {
    fn block_size(&self) -> usize {
        16
    }

    fn process_block(&mut self, block: &mut [u8]) {
        self.0.encrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// AES-128 pre-keyed for decryption.
pub struct AesDecrypt(Aes128);

impl AesDecrypt {
    pub fn new(key: &[u8; 16]) -> Self {
        Self(Aes128::new(GenericArray::from_slice(key)))
    }
}

impl BlockCipher for AesDecrypt {
    fn block_size(&self) -> usize {
        16
    }

    fn process_block(&mut self, block: &mut [u8]) {
        self.0.decrypt_block(GenericArray::from_mut_slice(block));
    }
}
