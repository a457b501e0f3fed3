//! IOKit Bindings for the AppleSMC User Client
//!
//! Raw FFI surface plus an RAII connection handle. The SMC speaks a single
//! struct-based ioctl (`IOConnectCallStructMethod` selector 2) carrying an
//! 80-byte request/response record; commands select key-info lookup, byte
//! reads, and index-to-name enumeration.

use std::ffi::c_void;
use std::os::raw::c_char;

use crate::error::{Error, Result};
use crate::smc::decode::{decode, fourcc_from_key, fourcc_to_string, RawValue};

// =============================================================================
// Protocol Constants
// =============================================================================

const KERNEL_INDEX_SMC: u32 = 2;

const SMC_CMD_READ_BYTES: u8 = 5;
const SMC_CMD_READ_INDEX: u8 = 8;
const SMC_CMD_READ_KEYINFO: u8 = 9;

/// Key holding the total number of SMC keys, as a big-endian ui32.
const KEY_COUNT_KEY: &str = "#KEY";

const KERN_SUCCESS: i32 = 0;
const MACH_PORT_NULL: u32 = 0;

// =============================================================================
// Wire Structures
// =============================================================================

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SmcVersion {
    major: u8,
    minor: u8,
    build: u8,
    reserved: u8,
    release: u16,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SmcPLimitData {
    version: u16,
    length: u16,
    cpu_plimit: u32,
    gpu_plimit: u32,
    mem_plimit: u32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SmcKeyInfo {
    data_size: u32,
    data_type: u32,
    data_attributes: u8,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SmcKeyData {
    key: u32,
    vers: SmcVersion,
    p_limit: SmcPLimitData,
    key_info: SmcKeyInfo,
    result: u8,
    status: u8,
    data8: u8,
    data32: u32,
    bytes: [u8; 32],
}

// =============================================================================
// IOKit FFI
// =============================================================================

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOMasterPort(bootstrap_port: u32, master_port: *mut u32) -> i32;
    fn IOServiceMatching(name: *const c_char) -> *mut c_void;
    fn IOServiceGetMatchingServices(
        master_port: u32,
        matching: *mut c_void,
        existing: *mut u32,
    ) -> i32;
    fn IOIteratorNext(iterator: u32) -> u32;
    fn IOObjectRelease(object: u32) -> i32;
    fn IOServiceOpen(service: u32, owning_task: u32, conn_type: u32, connect: *mut u32) -> i32;
    fn IOServiceClose(connect: u32) -> i32;
    fn IOConnectCallStructMethod(
        connection: u32,
        selector: u32,
        input: *const c_void,
        input_cnt: usize,
        output: *mut c_void,
        output_cnt: *mut usize,
    ) -> i32;
}

// =============================================================================
// Connection Handle
// =============================================================================

/// An open user-client connection to the AppleSMC service. Closed on drop;
/// one connection is opened and closed around each scrape.
pub struct SmcConnection {
    conn: u32,
}

impl SmcConnection {
    /// Locate the AppleSMC service and open a user-client connection.
    pub fn open() -> Result<Self> {
        let mut master_port: u32 = MACH_PORT_NULL;
        let mut iterator: u32 = 0;

        unsafe {
            let kr = IOMasterPort(MACH_PORT_NULL, &mut master_port);
            if kr != KERN_SUCCESS {
                return Err(Error::SmcCall { op: "IOMasterPort", code: kr });
            }

            // Consumed by IOServiceGetMatchingServices, no release needed.
            let matching = IOServiceMatching(b"AppleSMC\0".as_ptr() as *const c_char);
            let kr = IOServiceGetMatchingServices(master_port, matching, &mut iterator);
            if kr != KERN_SUCCESS {
                return Err(Error::SmcCall {
                    op: "IOServiceGetMatchingServices",
                    code: kr,
                });
            }

            let device = IOIteratorNext(iterator);
            IOObjectRelease(iterator);
            if device == 0 {
                return Err(Error::Hardware("no AppleSMC service found".into()));
            }

            let mut conn: u32 = 0;
            let kr = IOServiceOpen(device, libc::mach_task_self(), 0, &mut conn);
            IOObjectRelease(device);
            if kr != KERN_SUCCESS {
                return Err(Error::SmcCall { op: "IOServiceOpen", code: kr });
            }

            Ok(Self { conn })
        }
    }

    /// One request/response round trip through the SMC user client.
    fn call(&self, input: &SmcKeyData) -> Result<SmcKeyData> {
        let mut output = SmcKeyData::default();
        let mut output_cnt = std::mem::size_of::<SmcKeyData>();

        let kr = unsafe {
            IOConnectCallStructMethod(
                self.conn,
                KERNEL_INDEX_SMC,
                input as *const SmcKeyData as *const c_void,
                std::mem::size_of::<SmcKeyData>(),
                &mut output as *mut SmcKeyData as *mut c_void,
                &mut output_cnt,
            )
        };
        if kr != KERN_SUCCESS {
            return Err(Error::SmcCall {
                op: "IOConnectCallStructMethod",
                code: kr,
            });
        }

        Ok(output)
    }

    fn key_info(&self, key: u32) -> Result<SmcKeyInfo> {
        let input = SmcKeyData {
            key,
            data8: SMC_CMD_READ_KEYINFO,
            ..Default::default()
        };
        Ok(self.call(&input)?.key_info)
    }

    /// Read and decode one key. `Ok(None)` means the key exists but carries
    /// a data type the exporter does not model.
    pub fn read_key(&self, key: &str) -> Result<Option<RawValue>> {
        let code = fourcc_from_key(key);
        let info = self.key_info(code)?;

        let size = info.data_size as usize;
        if size == 0 || size > 32 {
            return Ok(None);
        }

        let input = SmcKeyData {
            key: code,
            key_info: SmcKeyInfo {
                data_size: info.data_size,
                ..Default::default()
            },
            data8: SMC_CMD_READ_BYTES,
            ..Default::default()
        };
        let output = self.call(&input)?;

        Ok(decode(&info.data_type.to_be_bytes(), &output.bytes[..size]))
    }

    /// Total number of keys the SMC exposes.
    pub fn key_count(&self) -> Result<u32> {
        match self.read_key(KEY_COUNT_KEY)? {
            Some(RawValue::Unsigned(count)) => Ok(count as u32),
            _ => Err(Error::Hardware("could not read SMC key count".into())),
        }
    }

    /// Name of the key at the given enumeration index.
    pub fn key_name(&self, index: u32) -> Result<String> {
        let input = SmcKeyData {
            data8: SMC_CMD_READ_INDEX,
            data32: index,
            ..Default::default()
        };
        let output = self.call(&input)?;
        Ok(fourcc_to_string(output.key))
    }
}

impl Drop for SmcConnection {
    fn drop(&mut self) {
        unsafe {
            IOServiceClose(self.conn);
        }
    }
}
