/// A gain value driven by scheduled automation: at most one pending
/// segment at a time, evaluated one sample per `process` call.
#[derive(Clone, Copy)]
pub struct GainEnvelope {
    /// Duration of a sample in seconds.
    inv_sample_rate: f32,
    /// Samples processed since construction.
    now: u64,
    /// The current gain.
    value: f32,
    /// The pending automation segment.
    state: Automation,
}

#[derive(Clone, Copy)]
enum Automation {
    Idle,
    /// Linear ramp from the value held when the ramp was scheduled.
    Ramp {
        from: f32,
        to: f32,
        start: u64,
        end: u64,
    },
    /// One-pole exponential approach; never quite arrives.
    Target { to: f32, coeff: f32 },
}

impl GainEnvelope {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            inv_sample_rate: (sample_rate as f32).recip(),
            now: 0,
            value: 0.0,
            state: Automation::Idle,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Jumps to a value immediately, dropping any pending automation.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.state = Automation::Idle;
    }

    /// Ramps linearly from the current value to `to` over `duration` seconds.
    pub fn linear_ramp_to(&mut self, to: f32, duration: f32) {
        let samples = ((duration / self.inv_sample_rate) as u64).max(1);
        self.state = Automation::Ramp {
            from: self.value,
            to,
            start: self.now,
            end: self.now + samples,
        };
    }

    /// Approaches `to` exponentially with the given time constant in seconds.
    pub fn set_target(&mut self, to: f32, time_constant: f32) {
        let coeff = 1.0 - (-self.inv_sample_rate / time_constant).exp();
        self.state = Automation::Target { to, coeff };
    }

    /// Drops pending automation, freezing the envelope at its current value.
    pub fn cancel_scheduled(&mut self) {
        self.state = Automation::Idle;
    }

    /// Advances one sample and returns the gain for it.
    pub fn process(&mut self) -> f32 {
        use Automation::*;
        match self.state {
            Idle => {}
            Ramp {
                from,
                to,
                start,
                end,
            } => {
                if self.now >= end {
                    self.value = to;
                    self.state = Idle;
                } else {
                    let t = (self.now - start) as f32 / (end - start) as f32;
                    self.value = from + (to - from) * t;
                }
            }
            Target { to, coeff } => {
                self.value += coeff * (to - self.value);
            }
        }
        self.now += 1;
        self.value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ramp_reaches_its_target_on_schedule() {
        let mut env = GainEnvelope::new(1000);
        env.linear_ramp_to(0.5, 0.1);
        let mut last = 0.0;
        for _ in 0..100 {
            let next = env.process();
            assert!(next >= last, "ramp must be monotone");
            last = next;
        }
        assert!((env.value() - 0.5).abs() < 0.01);
        // Holds after completion.
        for _ in 0..50 {
            env.process();
        }
        assert_eq!(env.value(), 0.5);
    }

    #[test]
    fn ramp_midpoint_is_half_way() {
        let mut env = GainEnvelope::new(1000);
        env.linear_ramp_to(1.0, 0.2);
        for _ in 0..100 {
            env.process();
        }
        assert!((env.value() - 0.5).abs() < 0.02);
    }

    #[test]
    fn target_decays_by_one_time_constant() {
        let mut env = GainEnvelope::new(1000);
        env.set_value(1.0);
        env.set_target(0.0, 0.1);
        for _ in 0..100 {
            env.process();
        }
        // After one time constant the value is e^-1 of the start.
        assert!((env.value() - (-1.0f32).exp()).abs() < 1e-3);
    }

    #[test]
    fn cancel_freezes_the_current_value() {
        let mut env = GainEnvelope::new(1000);
        env.linear_ramp_to(1.0, 0.1);
        for _ in 0..50 {
            env.process();
        }
        let frozen = env.value();
        env.cancel_scheduled();
        for _ in 0..100 {
            env.process();
        }
        assert_eq!(env.value(), frozen);
    }

    #[test]
    fn ramp_restarts_from_the_current_value() {
        let mut env = GainEnvelope::new(1000);
        env.linear_ramp_to(1.0, 0.1);
        for _ in 0..50 {
            env.process();
        }
        env.linear_ramp_to(0.0, 0.1);
        let first = env.process();
        assert!(first <= env.value() + 1e-6 && first < 0.6);
    }
}
