//! A blocking `AF_PACKET`/`SOCK_RAW` transport bound to one network
//! interface.
//!
//! Built directly on `libc` rather than a safe-Rust socket crate because
//! raw Ethernet access isn't exposed by `std::net` — this mirrors
//! `original_source/treasure_protocol.c`'s `cria_raw_socket`,
//! `enviar_pacote`, and `receber_pacote` one-to-one, down to enabling
//! promiscuous mode with `PACKET_ADD_MEMBERSHIP`.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::RawFd;
use std::time::Duration;

use log::{debug, trace};

use super::{RecvOutcome, Received, Transport};
use crate::core::{Frame, ETHERNET_HEADER_SIZE, ETHER_TYPE};
use crate::error::{Error, Result};
use crate::mac::MacAddr;
use crate::seq::Seq;

/// Matches the reference implementation's `TAM_MAX_PACOTE`: standard
/// Ethernet MTU plus header slack.
const RECV_BUFFER_SIZE: usize = 1500;

/// A raw Ethernet socket bound to one interface, in promiscuous mode.
pub struct RawEthernetSocket {
    fd: RawFd,
    local_mac: MacAddr,
}

impl RawEthernetSocket {
    /// Opens and binds a raw socket to `interface`, joining promiscuous
    /// mode so frames addressed to other hosts on the segment are still
    /// delivered to this process.
    pub fn open(interface: &str, local_mac: MacAddr, read_timeout: Duration) -> Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, htons(libc::ETH_P_ALL as u16) as i32) };
        if fd < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        let ifindex = interface_index(interface).map_err(|e| {
            unsafe { libc::close(fd) };
            e
        })?;

        let mut sll: libc::sockaddr_ll = unsafe { mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_protocol = htons(libc::ETH_P_ALL as u16);
        sll.sll_ifindex = ifindex;

        let bind_rc = unsafe {
            libc::bind(
                fd,
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as u32,
            )
        };
        if bind_rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(Error::Io(err));
        }

        let mut mreq: libc::packet_mreq = unsafe { mem::zeroed() };
        mreq.mr_ifindex = ifindex;
        mreq.mr_type = libc::PACKET_MR_PROMISC as u16;
        let promisc_rc = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_PACKET,
                libc::PACKET_ADD_MEMBERSHIP,
                &mreq as *const libc::packet_mreq as *const libc::c_void,
                mem::size_of::<libc::packet_mreq>() as u32,
            )
        };
        if promisc_rc < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(Error::Io(err));
        }

        let timeout = libc::timeval {
            tv_sec: read_timeout.as_secs() as libc::time_t,
            tv_usec: read_timeout.subsec_micros() as libc::suseconds_t,
        };
        unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &timeout as *const libc::timeval as *const libc::c_void,
                mem::size_of::<libc::timeval>() as u32,
            );
        }

        debug!("raw socket bound to {interface} (ifindex {ifindex}), promiscuous mode enabled");
        Ok(RawEthernetSocket { fd, local_mac })
    }

    /// Duplicates the underlying file descriptor so a second thread can
    /// send independently while another thread owns `recv` — the same
    /// pattern as `std::net::TcpStream::try_clone`.
    pub fn try_clone(&self) -> Result<Self> {
        let fd = unsafe { libc::dup(self.fd) };
        if fd < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(RawEthernetSocket { fd, local_mac: self.local_mac })
    }
}

impl Drop for RawEthernetSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Transport for RawEthernetSocket {
    fn send(&mut self, dst: MacAddr, frame_type: crate::core::FrameType, seq: Seq, payload: &[u8]) -> Result<()> {
        let frame = Frame::new(frame_type, seq, payload.to_vec())?;
        let link_payload = frame.encode();

        let mut buf = Vec::with_capacity(ETHERNET_HEADER_SIZE + link_payload.len());
        buf.extend_from_slice(dst.as_bytes());
        buf.extend_from_slice(self.local_mac.as_bytes());
        buf.extend_from_slice(&ETHER_TYPE.to_be_bytes());
        buf.extend_from_slice(&link_payload);

        let mut sll: libc::sockaddr_ll = unsafe { mem::zeroed() };
        sll.sll_family = libc::AF_PACKET as u16;
        sll.sll_halen = 6;
        sll.sll_addr[..6].copy_from_slice(dst.as_bytes());

        let n = unsafe {
            libc::sendto(
                self.fd,
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
                0,
                &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as u32,
            )
        };
        if n < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        trace!("sent {:?} seq={} ({} payload bytes) to {dst}", frame_type, seq.get(), payload.len());
        Ok(())
    }

    fn recv(&mut self) -> Result<RecvOutcome> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let n = unsafe { libc::recv(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                return Ok(RecvOutcome::WouldBlock);
            }
            return Err(Error::Io(err));
        }
        let n = n as usize;
        if n < ETHERNET_HEADER_SIZE {
            trace!("dropped short ethernet frame ({n} bytes)");
            return Ok(RecvOutcome::WouldBlock);
        }

        let ethertype = u16::from_be_bytes([buf[12], buf[13]]);
        if ethertype != ETHER_TYPE {
            return Ok(RecvOutcome::WouldBlock);
        }

        let mut src = [0u8; 6];
        src.copy_from_slice(&buf[6..12]);

        match Frame::decode(&buf[ETHERNET_HEADER_SIZE..n]) {
            Ok(frame) => Ok(RecvOutcome::Frame(Received {
                src: MacAddr::new(src),
                frame_type: frame.frame_type,
                seq: frame.seq,
                payload: frame.payload,
            })),
            Err(e) => {
                debug!("dropped malformed frame: {e}");
                Ok(RecvOutcome::WouldBlock)
            }
        }
    }
}

fn interface_index(name: &str) -> Result<i32> {
    let cname = CString::new(name).map_err(|_| Error::InvalidState("interface name contains NUL"))?;
    let index = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if index == 0 {
        return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(index as i32)
}

fn htons(v: u16) -> u16 {
    v.to_be()
}
