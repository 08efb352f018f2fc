use burn::module::Module;
use burn::nn::conv::{Conv1d, Conv1dConfig};
use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig, PaddingConfig1d};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::{SequenceClassifier, SideChannel};

#[derive(Debug, Clone)]
pub struct ClstmConfig {
    /// Features per time step.
    pub input_size: usize,
    /// Maximum number of time steps consumed; longer inputs are truncated.
    pub resampling: usize,
    pub conv_channels: usize,
    pub hidden: usize,
    pub num_classes: usize,
}

impl Default for ClstmConfig {
    fn default() -> Self {
        Self {
            input_size: 32,
            resampling: 500,
            conv_channels: 32,
            hidden: 64,
            num_classes: 2,
        }
    }
}

/// Convolution over time followed by an LSTM and a linear classification head.
#[derive(Debug, Module)]
pub struct Clstm<B: Backend> {
    conv: Conv1d<B>,
    lstm: Lstm<B>,
    head: Linear<B>,
    resampling: usize,
}

impl<B: Backend> Clstm<B> {
    pub fn new(cfg: ClstmConfig, device: &B::Device) -> Self {
        let input_size = cfg.input_size.max(1);
        let conv = Conv1dConfig::new(input_size, cfg.conv_channels, 3)
            .with_padding(PaddingConfig1d::Same)
            .init(device);
        let lstm = LstmConfig::new(cfg.conv_channels, cfg.hidden, true).init(device);
        let head = LinearConfig::new(cfg.hidden, cfg.num_classes.max(2)).init(device);
        Self {
            conv,
            lstm,
            head,
            resampling: cfg.resampling.max(1),
        }
    }

    pub fn resampling(&self) -> usize {
        self.resampling
    }

    /// Logits for `input` of shape [batch, time, features].
    ///
    /// With `lengths`, the hidden state at each sample's last unpadded step is classified;
    /// otherwise the final step is used for every sample.
    pub fn logits(&self, input: Tensor<B, 3>, lengths: Option<Tensor<B, 1, Int>>) -> Tensor<B, 2> {
        let [batch, time, features] = input.dims();
        let steps = time.min(self.resampling);
        let input = if steps < time {
            input.slice([0..batch, 0..steps, 0..features])
        } else {
            input
        };

        // Conv1d expects [batch, channels, length].
        let x = relu(self.conv.forward(input.swap_dims(1, 2)));
        let (seq, _state) = self.lstm.forward(x.swap_dims(1, 2), None);
        let hidden = seq.dims()[2];

        let last = match lengths {
            Some(lengths) => {
                let index = lengths
                    .clamp(1, steps as i64)
                    .sub_scalar(1)
                    .reshape([batch, 1, 1])
                    .repeat_dim(2, hidden);
                seq.gather(1, index)
            }
            None => seq.slice([0..batch, steps - 1..steps, 0..hidden]),
        };
        self.head.forward(last.reshape([batch, hidden]))
    }
}

impl<B: Backend> SequenceClassifier<B> for Clstm<B> {
    fn forward(&self, input: Tensor<B, 3>, side: Option<SideChannel<B>>) -> Tensor<B, 2> {
        self.logits(input, side.map(|s| s.lengths))
    }
}
