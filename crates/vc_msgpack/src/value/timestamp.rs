use core::fmt;
use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u32 = 1_000_000_000;

// -----------------------------------------------------------------------------
// Timestamp

/// A point in time as carried by the MessagePack timestamp extension (type `-1`).
///
/// `seconds` counts from the Unix epoch and may be negative; `nanoseconds`
/// is always below one second. Encoding picks the narrowest layout:
///
/// | layout  | used when                                   |
/// |---------|---------------------------------------------|
/// | 32-bit  | `0 <= seconds < 2^32` and `nanoseconds == 0`  |
/// | 64-bit  | `0 <= seconds < 2^34`                         |
/// | 96-bit  | otherwise                                   |
///
/// # Examples
///
/// ```
/// use vc_msgpack::value::Timestamp;
///
/// let ts = Timestamp::new(-1, 500_000_000).unwrap();
/// let mut buf = [0; 12];
/// let payload = ts.encode(&mut buf);
/// assert_eq!(payload.len(), 12);
/// assert_eq!(Timestamp::decode(payload), Some(ts));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: u32,
}

impl Timestamp {
    /// Creates a timestamp, or `None` if `nanoseconds` is a second or more.
    #[inline]
    pub const fn new(seconds: i64, nanoseconds: u32) -> Option<Self> {
        if nanoseconds < NANOS_PER_SEC {
            Some(Self {
                seconds,
                nanoseconds,
            })
        } else {
            None
        }
    }

    /// Creates a timestamp on a whole second.
    #[inline]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }

    #[inline]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    #[inline]
    pub const fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// Milliseconds since the Unix epoch, rounded toward negative infinity.
    pub const fn unix_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add((self.nanoseconds / 1_000_000) as i64)
    }

    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanoseconds: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    /// Converts a [`SystemTime`], including times before the epoch.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self {
                seconds: after.as_secs() as i64,
                nanoseconds: after.subsec_nanos(),
            },
            Err(err) => {
                let before = err.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanoseconds = before.subsec_nanos();
                if nanoseconds > 0 {
                    seconds -= 1;
                    nanoseconds = NANOS_PER_SEC - nanoseconds;
                }
                Self {
                    seconds,
                    nanoseconds,
                }
            }
        }
    }

    /// Converts to a [`SystemTime`], or `None` if the platform cannot represent it.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        if self.seconds >= 0 {
            let since = Duration::new(self.seconds as u64, self.nanoseconds);
            UNIX_EPOCH.checked_add(since)
        } else {
            let back = Duration::from_secs(self.seconds.unsigned_abs());
            UNIX_EPOCH
                .checked_sub(back)?
                .checked_add(Duration::from_nanos(u64::from(self.nanoseconds)))
        }
    }

    /// Writes the extension payload into `buf` and returns the used prefix.
    pub fn encode<'a>(&self, buf: &'a mut [u8; 12]) -> &'a [u8] {
        if self.seconds >= 0 && self.seconds >> 34 == 0 {
            let data64 = (u64::from(self.nanoseconds) << 34) | self.seconds as u64;
            if data64 & 0xffff_ffff_0000_0000 == 0 {
                buf[..4].copy_from_slice(&(data64 as u32).to_be_bytes());
                &buf[..4]
            } else {
                buf[..8].copy_from_slice(&data64.to_be_bytes());
                &buf[..8]
            }
        } else {
            buf[..4].copy_from_slice(&self.nanoseconds.to_be_bytes());
            buf[4..].copy_from_slice(&self.seconds.to_be_bytes());
            &buf[..]
        }
    }

    /// Decodes a 4, 8 or 12 byte extension payload.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        match *payload {
            [a, b, c, d] => Some(Self::from_seconds(i64::from(u32::from_be_bytes([a, b, c, d])))),
            [..] if payload.len() == 8 => {
                let data64 = u64::from_be_bytes(payload.try_into().ok()?);
                Self::new((data64 & 0x3_ffff_ffff) as i64, (data64 >> 34) as u32)
            }
            [a, b, c, d, ref rest @ ..] if rest.len() == 8 => {
                let seconds = i64::from_be_bytes(rest.try_into().ok()?);
                Self::new(seconds, u32::from_be_bytes([a, b, c, d]))
            }
            _ => None,
        }
    }
}

impl From<SystemTime> for Timestamp {
    #[inline]
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}.{:09})", self.seconds, self.nanoseconds)
    }
}
