use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::log_softmax::{log_softmax, log_softmax_backward};
use crate::error::{Error, Result};
use crate::layers::dense::Linear;
use crate::layers::dropout::Dropout;
use crate::math::matrix::Matrix;
use crate::network::spec::NetworkSpec;
use crate::network::state_dict::{StateDict, Tensor};
use crate::optim::Parameter;

/// Feed-forward classifier.
///
/// Every hidden layer runs `Linear → activation → Dropout`; the output layer
/// runs `Linear → log_softmax`, so `forward` returns log-probabilities of
/// shape `(batch, output_size)`.
#[derive(Debug, Clone)]
pub struct Network {
    spec: NetworkSpec,
    hidden: Vec<Linear>,
    dropouts: Vec<Dropout>,
    output: Linear,
    /// Pre-activation `z` of every hidden layer from the last forward pass.
    pre_activations: Vec<Matrix>,
    log_probs: Option<Matrix>,
    training: bool,
    rng: StdRng,
}

impl Network {
    /// Builds a randomly initialised network in training mode.
    pub fn new(spec: NetworkSpec) -> Result<Network> {
        Network::build(spec, StdRng::from_entropy())
    }

    /// Like `new`, but initialisation and dropout masks are reproducible.
    pub fn with_seed(spec: NetworkSpec, seed: u64) -> Result<Network> {
        Network::build(spec, StdRng::seed_from_u64(seed))
    }

    fn build(spec: NetworkSpec, mut rng: StdRng) -> Result<Network> {
        spec.validate()?;

        let sizes = spec.layer_sizes();
        let n_hidden = spec.hidden_layers.len();
        let hidden = sizes
            .windows(2)
            .take(n_hidden)
            .map(|w| Linear::new(w[0], w[1], &mut rng))
            .collect();
        let dropouts = (0..n_hidden)
            .map(|_| Dropout::new(spec.drop_p))
            .collect::<Result<Vec<_>>>()?;
        let output = Linear::new(sizes[n_hidden], spec.output_size, &mut rng);

        Ok(Network {
            spec,
            hidden,
            dropouts,
            output,
            pre_activations: Vec::with_capacity(n_hidden),
            log_probs: None,
            training: true,
            rng,
        })
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    /// Hidden-layer widths in input → output order.
    pub fn hidden_layers(&self) -> &[usize] {
        &self.spec.hidden_layers
    }

    /// Enables dropout.
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Disables dropout.
    pub fn eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Forward pass over a `(batch, input_size)` matrix; returns
    /// log-probabilities and caches what `backward` needs.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.spec.input_size {
            return Err(Error::shape_mismatch(
                "input",
                vec![input.rows, self.spec.input_size],
                input.shape(),
            ));
        }

        let activation = self.spec.activation;
        self.pre_activations.clear();

        let mut current = input.clone();
        for (linear, dropout) in self.hidden.iter_mut().zip(self.dropouts.iter_mut()) {
            let z = linear.forward(&current);
            let a = z.map(|v| activation.function(v));
            current = dropout.forward(&a, self.training, &mut self.rng);
            self.pre_activations.push(z);
        }

        let log_probs = log_softmax(&self.output.forward(&current));
        self.log_probs = Some(log_probs.clone());
        Ok(log_probs)
    }

    /// Backward pass from ∂L/∂(log p); accumulates gradients in every layer.
    pub fn backward(&mut self, grad_log_probs: &Matrix) -> Result<()> {
        let log_probs = self
            .log_probs
            .as_ref()
            .ok_or_else(|| Error::model("Network::backward called before forward"))?;
        if grad_log_probs.shape() != log_probs.shape() {
            return Err(Error::shape_mismatch(
                "grad_log_probs",
                log_probs.shape(),
                grad_log_probs.shape(),
            ));
        }

        let activation = self.spec.activation;
        let mut grad = log_softmax_backward(grad_log_probs, log_probs);
        grad = self.output.backward(&grad)?;

        for i in (0..self.hidden.len()).rev() {
            grad = self.dropouts[i].backward(&grad);
            let act_derivative = self.pre_activations[i].map(|z| activation.derivative(z));
            grad = grad.hadamard(&act_derivative);
            grad = self.hidden[i].backward(&grad)?;
        }

        Ok(())
    }

    /// Class probabilities with dropout disabled; the previous mode is
    /// restored afterwards.
    pub fn predict_proba(&mut self, input: &Matrix) -> Result<Matrix> {
        let was_training = self.training;
        self.training = false;
        let log_probs = self.forward(input);
        self.training = was_training;
        Ok(log_probs?.map(f64::exp))
    }

    /// Most likely class per row.
    pub fn predict(&mut self, input: &Matrix) -> Result<Vec<usize>> {
        Ok(self.predict_proba(input)?.argmax_rows())
    }

    pub fn zero_grad(&mut self) {
        for layer in self.hidden.iter_mut() {
            layer.zero_grad();
        }
        self.output.zero_grad();
    }

    /// Mutable views of every parameter paired with its gradient, in
    /// state-dict naming.
    pub fn parameters_mut(&mut self) -> Vec<Parameter<'_>> {
        let mut params = Vec::with_capacity(2 * (self.hidden.len() + 1));
        for (i, layer) in self.hidden.iter_mut().enumerate() {
            push_linear(&mut params, &format!("hidden_layers.{i}"), layer);
        }
        push_linear(&mut params, "output", &mut self.output);
        params
    }

    pub fn num_parameters(&self) -> usize {
        self.named_layers().iter().map(|(_, l)| l.num_parameters()).sum()
    }

    /// Snapshot of every learned parameter.
    pub fn state_dict(&self) -> StateDict {
        let mut sd = StateDict::new();
        for (prefix, layer) in self.named_layers() {
            sd.insert(format!("{prefix}.weight"), Tensor::from(&layer.weights));
            sd.insert(format!("{prefix}.bias"), Tensor::from(&layer.biases));
        }
        sd
    }

    /// Copies parameter values from `state_dict`.
    ///
    /// Strict: every parameter must be present with exactly the shape this
    /// network has, and no extra entries are allowed. Nothing is written
    /// unless every entry validates.
    pub fn load_state_dict(&mut self, state_dict: &StateDict) -> Result<()> {
        let expected: Vec<(String, Vec<usize>)> = self
            .named_layers()
            .into_iter()
            .flat_map(|(prefix, layer)| {
                [
                    (format!("{prefix}.weight"), layer.weights.shape()),
                    (format!("{prefix}.bias"), layer.biases.shape()),
                ]
            })
            .collect();

        for (name, shape) in &expected {
            let tensor = state_dict
                .get(name)
                .ok_or_else(|| Error::MissingParameter(name.clone()))?;
            if &tensor.shape != shape {
                return Err(Error::shape_mismatch(name.clone(), shape.clone(), tensor.shape.clone()));
            }
            if tensor.data.len() != tensor.numel() {
                return Err(Error::checkpoint(format!(
                    "`{name}` declares shape {:?} but holds {} values",
                    tensor.shape,
                    tensor.data.len()
                )));
            }
        }
        if let Some(extra) = state_dict
            .keys()
            .find(|k| !expected.iter().any(|(name, _)| name == *k))
        {
            return Err(Error::UnexpectedParameter(extra.clone()));
        }

        for param in self.parameters_mut() {
            if let Some(tensor) = state_dict.get(&param.name) {
                param.value.data.copy_from_slice(&tensor.data);
            }
        }
        self.zero_grad();
        self.clear_cache();
        Ok(())
    }

    fn clear_cache(&mut self) {
        for layer in self.hidden.iter_mut() {
            layer.clear_cache();
        }
        self.output.clear_cache();
        self.pre_activations.clear();
        self.log_probs = None;
    }

    fn named_layers(&self) -> Vec<(String, &Linear)> {
        self.hidden
            .iter()
            .enumerate()
            .map(|(i, layer)| (format!("hidden_layers.{i}"), layer))
            .chain(std::iter::once(("output".to_string(), &self.output)))
            .collect()
    }
}

fn push_linear<'a>(params: &mut Vec<Parameter<'a>>, prefix: &str, layer: &'a mut Linear) {
    let Linear { weights, biases, weight_grad, bias_grad, .. } = layer;
    params.push(Parameter {
        name: format!("{prefix}.weight"),
        value: weights,
        grad: weight_grad,
    });
    params.push(Parameter {
        name: format!("{prefix}.bias"),
        value: biases,
        grad: bias_grad,
    });
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Network({} -> {:?} -> {}, {}, dropout={})",
            self.spec.input_size,
            self.spec.hidden_layers,
            self.spec.output_size,
            self.spec.activation,
            self.spec.drop_p
        )
    }
}
