//! Example models shared by the scenario and property tests.
//!
//! Ported from the bank-queue and two-car relay models used to validate the
//! original event kernel this crate's design is grounded on. None of this is
//! part of the public library surface; it is scaffolding to exercise
//! [`desim::Simulation`] the way a real caller would.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Exp};

use desim::{Event, ProcessHandle, ProcessLogic, Resume, Simulation};

/// Turns on `trace!`/`debug!` output from the kernel for a test run, when
/// `RUST_LOG` is set. Safe to call from every test: `try_init` ignores the
/// "already initialized" error from a previous test in the same binary.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Draws from an exponential distribution with the given rate, mirroring
/// `expovariate` from the bank-queue model.
pub fn expovariate(rng: &mut SmallRng, lambda: f64) -> f64 {
    Exp::new(lambda).unwrap().sample(rng)
}

/// A process that does nothing but wait for a single event, then finish.
/// The simplest possible `ProcessLogic`, used to drive `any_of`/`all_of`
/// under a real process instead of polling their completion events by hand.
pub struct Awaiter {
    event: Option<Event>,
}

impl Awaiter {
    pub fn new(event: Event) -> Self {
        Awaiter { event: Some(event) }
    }
}

impl ProcessLogic for Awaiter {
    fn resume(&mut self, _sim: &Simulation) -> Resume {
        match self.event.take() {
            Some(event) => Resume::Await(event),
            None => Resume::Done,
        }
    }
}

/// A single-counter request queue. FIFO among pending requests; a request
/// that gives up (its caller aborts it) while queued is skipped rather than
/// granted when a slot frees up.
pub struct Resource {
    sim: Simulation,
    capacity: Cell<i32>,
    queue: RefCell<VecDeque<Event>>,
}

impl Resource {
    pub fn new(sim: &Simulation, capacity: i32) -> Rc<Self> {
        Rc::new(Resource {
            sim: sim.clone(),
            capacity: Cell::new(capacity),
            queue: RefCell::new(VecDeque::new()),
        })
    }

    /// Requests a slot. The returned event triggers once one is granted;
    /// abort it to give up your place in line.
    pub fn request(&self) -> Event {
        let request = self.sim.event();
        self.queue.borrow_mut().push_back(request.clone());
        self.drain();
        request
    }

    /// Frees a slot, granting it to the next request still waiting in line.
    pub fn release(&self) {
        self.capacity.set(self.capacity.get() + 1);
        self.drain();
    }

    pub fn queue_len(&self) -> usize {
        self.queue.borrow().len()
    }

    fn drain(&self) {
        while self.capacity.get() > 0 {
            let next = self.queue.borrow_mut().pop_front();
            let Some(request) = next else { break };
            if !request.is_pending() {
                continue;
            }
            self.capacity.set(self.capacity.get() - 1);
            let _ = request.trigger(0.0);
        }
    }
}

/// A bank customer: queues for a counter, gives up if the wait runs past
/// `max_wait_time`, otherwise is served for an exponentially distributed
/// time before releasing the counter.
pub struct Customer {
    pc: u32,
    mean_time_in_bank: f64,
    max_wait_time: f64,
    counters: Rc<Resource>,
    rng: Rc<RefCell<SmallRng>>,
    request: Option<Event>,
    pub id: u32,
    pub served: bool,
    pub balked: bool,
}

impl Customer {
    pub fn new(
        mean_time_in_bank: f64,
        max_wait_time: f64,
        counters: Rc<Resource>,
        rng: Rc<RefCell<SmallRng>>,
        id: u32,
    ) -> Self {
        Customer {
            pc: 0,
            mean_time_in_bank,
            max_wait_time,
            counters,
            rng,
            request: None,
            id,
            served: false,
            balked: false,
        }
    }
}

impl ProcessLogic for Customer {
    fn resume(&mut self, sim: &Simulation) -> Resume {
        loop {
            match self.pc {
                0 => {
                    let request = self.counters.request();
                    self.request = Some(request.clone());
                    let timeout = sim.timeout(self.max_wait_time).unwrap();
                    self.pc = 1;
                    return Resume::Await(sim.any_of([request, timeout]));
                }
                1 => {
                    let request = self.request.clone().unwrap();
                    if !request.is_triggered() {
                        request.abort();
                        self.balked = true;
                        return Resume::Done;
                    }
                    let rate = 1.0 / self.mean_time_in_bank;
                    let delay = expovariate(&mut self.rng.borrow_mut(), rate);
                    self.pc = 2;
                    return Resume::Await(sim.timeout(delay).unwrap());
                }
                2 => {
                    self.counters.release();
                    self.served = true;
                    return Resume::Done;
                }
                _ => unreachable!("Customer resumed past completion"),
            }
        }
    }
}

/// Spawns `n_customers` in a row, with exponentially distributed arrival
/// gaps, each contending for `counters`.
pub struct CustomerSource {
    next_id: u32,
    n_customers: u32,
    mean_arrival_interval: f64,
    mean_time_in_bank: f64,
    max_wait_time: f64,
    counters: Rc<Resource>,
    rng: Rc<RefCell<SmallRng>>,
    pub spawned: Vec<ProcessHandle>,
}

impl CustomerSource {
    pub fn new(
        n_customers: u32,
        mean_arrival_interval: f64,
        mean_time_in_bank: f64,
        max_wait_time: f64,
        counters: Rc<Resource>,
        rng: Rc<RefCell<SmallRng>>,
    ) -> Self {
        CustomerSource {
            next_id: 1,
            n_customers,
            mean_arrival_interval,
            mean_time_in_bank,
            max_wait_time,
            counters,
            rng,
            spawned: Vec::new(),
        }
    }
}

impl ProcessLogic for CustomerSource {
    fn resume(&mut self, sim: &Simulation) -> Resume {
        if self.next_id > self.n_customers {
            return Resume::Done;
        }
        let customer = Customer::new(
            self.mean_time_in_bank,
            self.max_wait_time,
            Rc::clone(&self.counters),
            Rc::clone(&self.rng),
            self.next_id,
        );
        self.spawned.push(sim.start_process(customer));
        self.next_id += 1;
        let rate = 1.0 / self.mean_arrival_interval;
        let delay = expovariate(&mut self.rng.borrow_mut(), rate);
        Resume::Await(sim.timeout(delay).unwrap())
    }
}

/// A car that drives in five-unit ticks until it has been running for at
/// least `duration` time units.
pub struct Car {
    waited_once: bool,
    finished: bool,
    target_time: f64,
    pub ticks: u32,
}

impl Car {
    pub fn new(sim: &Simulation, duration: f64) -> Self {
        Car {
            waited_once: false,
            finished: false,
            target_time: sim.now() + duration,
            ticks: 0,
        }
    }
}

impl ProcessLogic for Car {
    fn resume(&mut self, sim: &Simulation) -> Resume {
        if self.finished {
            return Resume::Done;
        }
        if self.waited_once {
            self.ticks += 1;
            if sim.now() >= self.target_time {
                self.finished = true;
                return Resume::Done;
            }
        }
        self.waited_once = true;
        Resume::Await(sim.timeout(5.0).unwrap())
    }
}

/// Runs two `Car` processes back to back, waiting for the first to finish
/// before starting the second.
pub struct TwoCars {
    pc: u32,
    duration: f64,
}

impl TwoCars {
    pub fn new(duration: f64) -> Self {
        TwoCars { pc: 0, duration }
    }
}

impl ProcessLogic for TwoCars {
    fn resume(&mut self, sim: &Simulation) -> Resume {
        match self.pc {
            0 => {
                let car = sim.start_process(Car::new(sim, self.duration));
                self.pc = 1;
                Resume::Await(car.into())
            }
            1 => {
                let car = sim.start_process(Car::new(sim, self.duration));
                self.pc = 2;
                Resume::Await(car.into())
            }
            2 => Resume::Done,
            _ => unreachable!("TwoCars resumed past completion"),
        }
    }
}
