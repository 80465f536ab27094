use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Subscript of a composite neuron name, e.g. the `y` in `degree_receiver_x_y_z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub description: String,
    pub position: usize,
    pub value: usize,
}

impl Identifier {
    pub fn new(description: &str, position: i64, value: i64) -> SimResult<Self> {
        if position < 0 {
            return Err(SimError::InvalidArgument(format!(
                "identifier {} has position {}, must be 0 or larger",
                description, position
            )));
        }

        if value < 0 {
            return Err(SimError::InvalidArgument(format!(
                "identifier {} has value {}, must be 0 or larger",
                description, value
            )));
        }

        Ok(Self {
            description: description.to_string(),
            position: position as usize,
            value: value as usize,
        })
    }
}

/// Snapshot of a Leaky-Integrate-and-Fire neuron at one timestep.
///
/// ```text
/// u[t] = u[t-1] * (1 - du) + a_in
/// v[t] = v[t-1] * (1 - dv) + u[t] + bias
/// spike = v[t] > vth, after which v[t] = 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifNeuron {
    name: String,
    identifiers: Option<Vec<Identifier>>,
    full_name: String,
    pos: Option<(f64, f64)>,
    bias: f64,
    du: f64,
    dv: f64,
    vth: f64,
    u: f64,
    v: f64,
    spikes: bool,
    a_in: f64,
    a_in_next: f64,
}

pub const V_RESET: f64 = 0.0;

impl LifNeuron {
    pub fn new(name: impl Into<String>, bias: f64, du: f64, dv: f64, vth: f64) -> SimResult<Self> {
        let name = name.into();
        let neuron = Self {
            full_name: name.clone(),
            name,
            identifiers: None,
            pos: None,
            bias,
            du,
            dv,
            vth,
            u: 0.0,
            v: 0.0,
            spikes: false,
            a_in: 0.0,
            a_in_next: 0.0,
        };

        neuron.validate()?;
        Ok(neuron)
    }

    pub fn with_identifiers(mut self, identifiers: Vec<Identifier>) -> SimResult<Self> {
        verify_identifiers(&self.name, &identifiers)?;
        self.full_name = full_neuron_name(&self.name, &identifiers);
        self.identifiers = Some(identifiers);
        Ok(self)
    }

    pub fn with_pos(mut self, pos: (f64, f64)) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Checks that the static parameters are finite, the identifiers consistent and
    /// the full name derived from them.
    /// Needed for snapshots that did not go through [`LifNeuron::new`].
    pub fn validate(&self) -> SimResult<()> {
        for (param, value) in [
            ("bias", self.bias),
            ("du", self.du),
            ("dv", self.dv),
            ("vth", self.vth),
        ] {
            if !value.is_finite() {
                return Err(SimError::TypeMismatch {
                    subject: format!("{} of neuron {}", param, self.full_name),
                    expected: "finite f64".to_string(),
                    actual: value.to_string(),
                });
            }
        }

        let expected_full_name = match &self.identifiers {
            Some(identifiers) => {
                verify_identifiers(&self.name, identifiers)?;
                full_neuron_name(&self.name, identifiers)
            }
            None => self.name.clone(),
        };

        if self.full_name != expected_full_name {
            return Err(SimError::TypeMismatch {
                subject: format!("full name of neuron {}", self.name),
                expected: expected_full_name,
                actual: self.full_name.clone(),
            });
        }

        Ok(())
    }

    /// Consumes `a_in` for one timestep and returns whether the neuron spiked.
    pub fn advance(&mut self, a_in: f64) -> bool {
        self.u = self.u * (1.0 - self.du) + a_in;

        let new_voltage = self.v * (1.0 - self.dv) + self.u + self.bias;

        // hard reset, not v - vth
        if new_voltage > self.vth {
            self.spikes = true;
            self.v = V_RESET;
        } else {
            self.spikes = false;
            self.v = new_voltage;
        }

        self.spikes
    }

    /// Models radiation induced threshold changes.
    pub fn set_vth(&mut self, vth: f64) -> SimResult<()> {
        if !vth.is_finite() {
            return Err(SimError::TypeMismatch {
                subject: format!("vth of neuron {}", self.full_name),
                expected: "finite f64".to_string(),
                actual: vth.to_string(),
            });
        }
        self.vth = vth;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn identifiers(&self) -> Option<&[Identifier]> {
        self.identifiers.as_deref()
    }

    pub fn pos(&self) -> Option<(f64, f64)> {
        self.pos
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn du(&self) -> f64 {
        self.du
    }

    pub fn dv(&self) -> f64 {
        self.dv
    }

    pub fn vth(&self) -> f64 {
        self.vth
    }

    pub fn u(&self) -> f64 {
        self.u
    }

    pub fn v(&self) -> f64 {
        self.v
    }

    pub fn spikes(&self) -> bool {
        self.spikes
    }

    pub fn a_in(&self) -> f64 {
        self.a_in
    }

    pub fn a_in_next(&self) -> f64 {
        self.a_in_next
    }

    pub(crate) fn clear_input_next(&mut self) {
        self.a_in_next = 0.0;
    }

    pub(crate) fn add_input_next(&mut self, current: f64) {
        self.a_in_next += current;
    }

    /// Moves the accumulated input into `a_in` for the following step.
    pub(crate) fn swap_input(&mut self) {
        self.a_in = self.a_in_next;
        self.a_in_next = 0.0;
    }

    pub(crate) fn set_recorded_state(&mut self, spikes: bool, v: f64, u: f64) {
        self.spikes = spikes;
        self.v = v;
        self.u = u;
    }
}

fn verify_identifiers(name: &str, identifiers: &[Identifier]) -> SimResult<()> {
    let positions: Vec<usize> = identifiers.iter().map(|id| id.position).collect();

    let is_permutation =
        !identifiers.is_empty() && (0..identifiers.len()).all(|i| positions.contains(&i));

    if !is_permutation {
        return Err(SimError::InvalidIdentifiers {
            name: name.to_string(),
            positions,
        });
    }

    Ok(())
}

fn full_neuron_name(base_name: &str, identifiers: &[Identifier]) -> String {
    let mut subscripts = vec![String::new(); identifiers.len()];
    for identifier in identifiers {
        subscripts[identifier.position] = format!("_{}", identifier.value);
    }
    format!("{}{}", base_name, subscripts.concat())
}
