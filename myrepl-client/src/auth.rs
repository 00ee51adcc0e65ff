//! authentication plugins
//!
//! contract: given the password and the server-supplied challenge,
//! produce the bytes the client sends back.
use sha1::{Digest, Sha1};

pub const NATIVE_PASSWORD: &str = "mysql_native_password";
pub const OLD_PASSWORD: &str = "mysql_old_password";
pub const CLEAR_PASSWORD: &str = "mysql_clear_password";

pub trait AuthPlugin {
    fn name(&self) -> &'static str;

    fn gen_response(&self, password: &str, challenge: &[u8]) -> Vec<u8>;
}

pub fn plugin_by_name(name: &str) -> Option<Box<dyn AuthPlugin>> {
    match name {
        NATIVE_PASSWORD => Some(Box::new(MysqlNativePassword)),
        OLD_PASSWORD => Some(Box::new(MysqlOldPassword)),
        CLEAR_PASSWORD => Some(Box::new(MysqlClearPassword)),
        _ => None,
    }
}

/// SHA1(password) XOR SHA1(challenge || SHA1(SHA1(password)))
#[derive(Debug)]
pub struct MysqlNativePassword;

impl AuthPlugin for MysqlNativePassword {
    fn name(&self) -> &'static str {
        NATIVE_PASSWORD
    }

    fn gen_response(&self, password: &str, challenge: &[u8]) -> Vec<u8> {
        if password.is_empty() {
            return Vec::new();
        }
        scramble_native(challenge, password.as_bytes()).to_vec()
    }
}

fn scramble_native(challenge: &[u8], password: &[u8]) -> [u8; 20] {
    fn sha1_1(bytes: &[u8]) -> [u8; 20] {
        Sha1::digest(bytes).into()
    }

    fn sha1_2(bytes1: &[u8], bytes2: &[u8]) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(bytes1);
        hasher.update(bytes2);
        hasher.finalize().into()
    }

    let stage1 = sha1_1(password);
    let mut out = sha1_2(challenge, &sha1_1(&stage1));
    for (o, s) in out.iter_mut().zip(stage1.iter()) {
        *o ^= s;
    }
    out
}

/// pre-4.1 challenge-response; rarely seen but some old servers still
/// switch to it
#[derive(Debug)]
pub struct MysqlOldPassword;

impl AuthPlugin for MysqlOldPassword {
    fn name(&self) -> &'static str {
        OLD_PASSWORD
    }

    fn gen_response(&self, password: &str, challenge: &[u8]) -> Vec<u8> {
        match scramble_323(challenge, password.as_bytes()) {
            Some(out) => out.to_vec(),
            None => Vec::new(),
        }
    }
}

fn hash_password_323(password: &[u8]) -> [u32; 2] {
    let mut nr: u32 = 1345345333;
    let mut add: u32 = 7;
    let mut nr2: u32 = 0x12345671;
    for &x in password {
        if x == b' ' || x == b'\t' {
            continue;
        }
        let tmp = x as u32;
        nr ^= (nr & 63)
            .wrapping_add(add)
            .wrapping_mul(tmp)
            .wrapping_add(nr << 8);
        nr2 = nr2.wrapping_add((nr2 << 8) ^ nr);
        add = add.wrapping_add(tmp);
    }
    [nr & 0x7fff_ffff, nr2 & 0x7fff_ffff]
}

fn scramble_323(challenge: &[u8], password: &[u8]) -> Option<[u8; 8]> {
    struct Rand323 {
        seed1: u32,
        seed2: u32,
    }

    impl Rand323 {
        fn my_rnd(&mut self) -> f64 {
            self.seed1 = (self.seed1 * 3 + self.seed2) % 0x3fff_ffff;
            self.seed2 = (self.seed1 + self.seed2 + 33) % 0x3fff_ffff;
            self.seed1 as f64 / 0x3fff_ffff as f64
        }
    }

    if password.is_empty() {
        return None;
    }
    let hash_pass = hash_password_323(password);
    let hash_message = hash_password_323(challenge);
    let mut rand_st = Rand323 {
        seed1: (hash_pass[0] ^ hash_message[0]) % 0x3fff_ffff,
        seed2: (hash_pass[1] ^ hash_message[1]) % 0x3fff_ffff,
    };
    let mut out = [0u8; 8];
    for x in out.iter_mut() {
        *x = ((rand_st.my_rnd() * 31.0).floor() + 64.0) as u8;
    }
    let extra = (rand_st.my_rnd() * 31.0).floor() as u8;
    for x in out.iter_mut() {
        *x ^= extra;
    }
    Some(out)
}

/// sends the password as-is; only sane over a trusted link
#[derive(Debug)]
pub struct MysqlClearPassword;

impl AuthPlugin for MysqlClearPassword {
    fn name(&self) -> &'static str {
        CLEAR_PASSWORD
    }

    fn gen_response(&self, password: &str, _challenge: &[u8]) -> Vec<u8> {
        Vec::from(password.as_bytes())
    }
}
