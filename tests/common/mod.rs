#![allow(dead_code)]

//! A simulated MT9V032 board: register file, supplies and master clock,
//! with one log of every bus and platform event in the order they happened.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::i2c::{Write, WriteRead};
use embedded_hal_mock::delay::MockNoop;
use mt9v032_i2c::registers::Register;
use mt9v032_i2c::{Mt9v032, Platform, PowerState, SensorConfig, DEFAULT_I2C_ADDRESS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Write(u8, u16),
    Read(u8),
    Clock(u32),
    Power(PowerState),
}

/// The sensor did not acknowledge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nack;

/// The supply could not be switched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupplyFault;

pub struct Board {
    pub regs: [u16; 256],
    pub version: u16,
    pub powered: bool,
    pub xclk: u32,
    /// Registers that ignore writes
    pub stuck: Vec<u8>,
    /// Registers whose writes are not acknowledged
    pub nack: Vec<u8>,
    /// Supply refuses to switch on
    pub supply_fault: bool,
    /// Sensor stops acknowledging even when powered
    pub unplugged: bool,
    pub events: Vec<Event>,
}

impl Board {
    fn responds(&self) -> bool {
        self.powered && self.xclk != 0 && !self.unplugged
    }

    pub fn reg(&self, reg: Register) -> u16 {
        self.regs[reg.addr() as usize]
    }

    pub fn writes(&self) -> Vec<(u8, u16)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                Event::Write(reg, value) => Some((reg, value)),
                _ => None,
            })
            .collect()
    }

    pub fn writes_to(&self, reg: Register) -> Vec<u16> {
        self.writes()
            .into_iter()
            .filter(|(r, _)| *r == reg.addr())
            .map(|(_, value)| value)
            .collect()
    }
}

pub type SharedBoard = Rc<RefCell<Board>>;

pub fn board(version: u16) -> SharedBoard {
    Rc::new(RefCell::new(Board {
        regs: [0; 256],
        version,
        powered: false,
        xclk: 0,
        stuck: Vec::new(),
        nack: Vec::new(),
        supply_fault: false,
        unplugged: false,
        events: Vec::new(),
    }))
}

pub struct SimBus(pub SharedBoard);

impl Write for SimBus {
    type Error = Nack;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Nack> {
        let mut board = self.0.borrow_mut();
        if address != DEFAULT_I2C_ADDRESS || !board.responds() || bytes.len() != 3 {
            return Err(Nack);
        }
        let reg = bytes[0];
        if board.nack.contains(&reg) {
            return Err(Nack);
        }
        let value = u16::from_be_bytes([bytes[1], bytes[2]]);
        board.events.push(Event::Write(reg, value));
        if reg == Register::Reset.addr() {
            // reset bits clear themselves
            return Ok(());
        }
        if reg != Register::ChipVersion.addr() && !board.stuck.contains(&reg) {
            board.regs[reg as usize] = value;
        }
        Ok(())
    }
}

impl WriteRead for SimBus {
    type Error = Nack;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Nack> {
        let mut board = self.0.borrow_mut();
        if address != DEFAULT_I2C_ADDRESS
            || !board.responds()
            || bytes.len() != 1
            || buffer.len() != 2
        {
            return Err(Nack);
        }
        let reg = bytes[0];
        board.events.push(Event::Read(reg));
        let value = if reg == Register::ChipVersion.addr() {
            board.version
        } else {
            board.regs[reg as usize]
        };
        buffer.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

pub struct SimPlatform(pub SharedBoard);

impl Platform for SimPlatform {
    type Error = SupplyFault;
    type PrivData = u32;

    fn set_power(&mut self, state: PowerState) -> Result<(), SupplyFault> {
        let mut board = self.0.borrow_mut();
        board.events.push(Event::Power(state));
        if state == PowerState::On && board.supply_fault {
            return Err(SupplyFault);
        }
        board.powered = state == PowerState::On;
        Ok(())
    }

    fn set_xclk(&mut self, frequency: u32) -> u32 {
        let mut board = self.0.borrow_mut();
        board.events.push(Event::Clock(frequency));
        board.xclk = frequency;
        frequency
    }

    fn priv_data(&mut self) -> Result<u32, SupplyFault> {
        Ok(0x5eed)
    }
}

pub type SimSensor = Mt9v032<SimBus, SimPlatform, MockNoop>;

pub fn sensor(board: &SharedBoard, config: SensorConfig) -> SimSensor {
    Mt9v032::new(
        SimBus(board.clone()),
        DEFAULT_I2C_ADDRESS,
        SimPlatform(board.clone()),
        MockNoop::new(),
        config,
    )
}

/// Supplies and clock on, without going through the driver
pub fn power_board(board: &SharedBoard) {
    let mut board = board.borrow_mut();
    board.powered = true;
    board.xclk = 27_000_000;
}

pub fn clear_events(board: &SharedBoard) {
    board.borrow_mut().events.clear();
}
